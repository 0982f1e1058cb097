use serde::{Deserialize, Serialize};

use crate::dataset::{MatchRecord, MatchResult, OddsTriple};
use crate::odds::implied_probabilities;
use crate::params::AnalyticsParams;
use crate::standings::momentum_score;

/// Historical record between one unordered pair of teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct H2HRecord {
    pub team_a: String,
    pub team_b: String,
    pub meetings: usize,
    pub team_a_wins: u32,
    pub team_b_wins: u32,
    pub draws: u32,
    pub team_a_goals: i64,
    pub team_b_goals: i64,
    /// Market-average 1X2 prices averaged across the meetings, in the
    /// fixture's home/draw/away orientation. Exchange prices excluded.
    pub avg_market_odds: OddsTriple,
    /// Mean implied probability that each team wins, over meetings with a
    /// complete market triple.
    pub team_a_market_prob: Option<f64>,
    pub team_b_market_prob: Option<f64>,
}

/// None when the two teams never met in the dataset.
pub fn h2h_record(matches: &[MatchRecord], team_a: &str, team_b: &str) -> Option<H2HRecord> {
    let meetings: Vec<&MatchRecord> = matches
        .iter()
        .filter(|m| {
            (m.home_team == team_a && m.away_team == team_b)
                || (m.home_team == team_b && m.away_team == team_a)
        })
        .collect();
    if meetings.is_empty() {
        return None;
    }

    let mut rec = H2HRecord {
        team_a: team_a.to_string(),
        team_b: team_b.to_string(),
        meetings: meetings.len(),
        team_a_wins: 0,
        team_b_wins: 0,
        draws: 0,
        team_a_goals: 0,
        team_b_goals: 0,
        avg_market_odds: OddsTriple::default(),
        team_a_market_prob: None,
        team_b_market_prob: None,
    };

    let mut odds_sum = [0.0f64; 3];
    let mut odds_n = [0usize; 3];
    let mut prob_a_sum = 0.0;
    let mut prob_b_sum = 0.0;
    let mut prob_n = 0usize;

    for m in &meetings {
        let a_home = m.home_team == team_a;
        match m.result {
            MatchResult::Draw => rec.draws += 1,
            MatchResult::HomeWin if a_home => rec.team_a_wins += 1,
            MatchResult::AwayWin if !a_home => rec.team_a_wins += 1,
            _ => rec.team_b_wins += 1,
        }
        let (a_goals, b_goals) = if a_home {
            (m.home_goals, m.away_goals)
        } else {
            (m.away_goals, m.home_goals)
        };
        rec.team_a_goals += a_goals;
        rec.team_b_goals += b_goals;

        let avg = &m.odds.market_avg;
        for (slot, value) in [avg.home, avg.draw, avg.away].into_iter().enumerate() {
            if let Some(v) = value {
                odds_sum[slot] += v;
                odds_n[slot] += 1;
            }
        }
        if let Some(probs) = implied_probabilities(avg) {
            let (p_a, p_b) = if a_home {
                (probs.home, probs.away)
            } else {
                (probs.away, probs.home)
            };
            prob_a_sum += p_a;
            prob_b_sum += p_b;
            prob_n += 1;
        }
    }

    let avg_leg = |slot: usize| {
        if odds_n[slot] > 0 {
            Some(odds_sum[slot] / odds_n[slot] as f64)
        } else {
            None
        }
    };
    rec.avg_market_odds = OddsTriple {
        home: avg_leg(0),
        draw: avg_leg(1),
        away: avg_leg(2),
    };
    if prob_n > 0 {
        rec.team_a_market_prob = Some(prob_a_sum / prob_n as f64);
        rec.team_b_market_prob = Some(prob_b_sum / prob_n as f64);
    }
    Some(rec)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Blended outcome probabilities for a hypothetical fixture, with the
/// component availability that backs the confidence grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinProbability {
    pub home_team: String,
    pub away_team: String,
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub confidence: Confidence,
    pub used_form: bool,
    pub used_h2h: bool,
    pub used_home_adv: bool,
    pub used_market: bool,
}

/// Weighted blend of recent form, head-to-head record, home advantage and
/// the market's view. A component only participates when both sides have
/// data for it; the weights of absent components are redistributed
/// proportionally over the rest.
pub fn win_probability(
    matches: &[MatchRecord],
    home_team: &str,
    away_team: &str,
    params: &AnalyticsParams,
) -> WinProbability {
    let h2h = h2h_record(matches, home_team, away_team);

    // Each component maps both teams into [0, 1].
    let form = {
        let home = momentum_score(matches, home_team, params);
        let away = momentum_score(matches, away_team, params);
        match (home, away) {
            (Some(h), Some(a)) => {
                let max = f64::from(params.points_win).max(1.0);
                Some((h / max, a / max))
            }
            _ => None,
        }
    };

    let h2h_rate = h2h.as_ref().map(|rec| {
        let n = rec.meetings as f64;
        (
            (f64::from(rec.team_a_wins) + 0.5 * f64::from(rec.draws)) / n,
            (f64::from(rec.team_b_wins) + 0.5 * f64::from(rec.draws)) / n,
        )
    });

    let home_adv = Some((params.home_adv_split, 1.0 - params.home_adv_split));

    let market = h2h.as_ref().and_then(|rec| {
        match (rec.team_a_market_prob, rec.team_b_market_prob) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    });

    let components = [
        (params.weight_form, form),
        (params.weight_h2h, h2h_rate),
        (params.weight_home_adv, home_adv),
        (params.weight_market, market),
    ];

    let weight_total: f64 = components
        .iter()
        .filter(|(_, c)| c.is_some())
        .map(|(w, _)| w)
        .sum();

    let (mut score_home, mut score_away) = (0.0, 0.0);
    if weight_total > 0.0 {
        for (weight, component) in &components {
            let Some((h, a)) = component else {
                continue;
            };
            score_home += (weight / weight_total) * h;
            score_away += (weight / weight_total) * a;
        }
    }

    let pair_total = score_home + score_away;
    let (p_home, p_away) = if pair_total > 0.0 {
        (score_home / pair_total, score_away / pair_total)
    } else {
        (0.5, 0.5)
    };

    let available = components.iter().filter(|(_, c)| c.is_some()).count();
    let confidence = if available == components.len() {
        Confidence::High
    } else if available >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    WinProbability {
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        home_win: p_home * (1.0 - params.draw_base),
        draw: params.draw_base,
        away_win: p_away * (1.0 - params.draw_base),
        confidence,
        used_form: form.is_some(),
        used_h2h: h2h_rate.is_some(),
        used_home_adv: home_adv.is_some(),
        used_market: market.is_some(),
    }
}
