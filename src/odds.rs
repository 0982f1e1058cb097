use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::{MatchRecord, MatchResult, OddsTriple};
use crate::params::AnalyticsParams;

/// Margin-normalized outcome probabilities from a 1X2 triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
    /// Raw inverse-odds sum before normalization; the bookmaker margin is
    /// this minus 1.
    pub overround: f64,
}

impl ImpliedProbs {
    pub fn for_result(&self, result: MatchResult) -> f64 {
        match result {
            MatchResult::HomeWin => self.home,
            MatchResult::Draw => self.draw,
            MatchResult::AwayWin => self.away,
        }
    }
}

/// p_i = (1/o_i) / sum_j (1/o_j). None unless all three odds are present.
pub fn implied_probabilities(triple: &OddsTriple) -> Option<ImpliedProbs> {
    let (home, draw, away) = (triple.home?, triple.draw?, triple.away?);
    if home <= 0.0 || draw <= 0.0 || away <= 0.0 {
        return None;
    }
    let inv = [1.0 / home, 1.0 / draw, 1.0 / away];
    let total: f64 = inv.iter().sum();
    Some(ImpliedProbs {
        home: inv[0] / total,
        draw: inv[1] / total,
        away: inv[2] / total,
        overround: total,
    })
}

/// Share of season matches ending in each outcome. The value-bet screen's
/// "actual probability" baseline; a coarse heuristic, not a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeFrequencies {
    pub matches: usize,
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeFrequencies {
    pub fn for_result(&self, result: MatchResult) -> f64 {
        match result {
            MatchResult::HomeWin => self.home,
            MatchResult::Draw => self.draw,
            MatchResult::AwayWin => self.away,
        }
    }
}

pub fn outcome_frequencies(matches: &[MatchRecord]) -> Option<OutcomeFrequencies> {
    if matches.is_empty() {
        return None;
    }
    let n = matches.len() as f64;
    let count = |want: MatchResult| matches.iter().filter(|m| m.result == want).count() as f64;
    Some(OutcomeFrequencies {
        matches: matches.len(),
        home: count(MatchResult::HomeWin) / n,
        draw: count(MatchResult::Draw) / n,
        away: count(MatchResult::AwayWin) / n,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBet {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub outcome: MatchResult,
    pub market_odds: f64,
    pub implied: f64,
    pub baseline: f64,
    /// baseline - implied; positive means the market underrates the outcome.
    pub edge: f64,
}

/// Screen every match/outcome against the league-wide baseline. Matches
/// without a complete market-average triple are skipped.
pub fn value_bets(matches: &[MatchRecord], params: &AnalyticsParams) -> Vec<ValueBet> {
    let Some(baseline) = outcome_frequencies(matches) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for m in matches {
        let Some(probs) = implied_probabilities(&m.odds.market_avg) else {
            continue;
        };
        for outcome in [MatchResult::HomeWin, MatchResult::Draw, MatchResult::AwayWin] {
            let implied = probs.for_result(outcome);
            let base = baseline.for_result(outcome);
            let edge = base - implied;
            if edge.abs() > params.value_bet_edge {
                let market_odds = match outcome {
                    MatchResult::HomeWin => m.odds.market_avg.home,
                    MatchResult::Draw => m.odds.market_avg.draw,
                    MatchResult::AwayWin => m.odds.market_avg.away,
                };
                let Some(market_odds) = market_odds else {
                    continue;
                };
                out.push(ValueBet {
                    date: m.date,
                    home_team: m.home_team.clone(),
                    away_team: m.away_team.clone(),
                    outcome,
                    market_odds,
                    implied,
                    baseline: base,
                    edge,
                });
            }
        }
    }
    out.sort_by(|a, b| b.edge.abs().total_cmp(&a.edge.abs()));
    out
}

/// Over/under 2.5 goals summary with a flat-stake ROI simulation of
/// blanket over-backing at average market prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverUnderReport {
    pub matches: usize,
    pub overs: usize,
    pub over_rate: f64,
    pub avg_over_odds: Option<f64>,
    pub avg_under_odds: Option<f64>,
    /// Profit per unit staked when backing over in every priced match.
    pub flat_over_roi: Option<f64>,
}

pub fn over_under_report(matches: &[MatchRecord]) -> Option<OverUnderReport> {
    if matches.is_empty() {
        return None;
    }
    let overs = matches.iter().filter(|m| m.total_goals() > 2).count();

    let avg = |values: Vec<f64>| {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };
    let avg_over_odds = avg(matches.iter().filter_map(|m| m.odds.avg_over25).collect());
    let avg_under_odds = avg(matches.iter().filter_map(|m| m.odds.avg_under25).collect());

    // Settle each priced match at its own price, one unit per bet.
    let mut staked = 0.0;
    let mut returned = 0.0;
    for m in matches {
        let Some(over) = m.odds.avg_over25 else {
            continue;
        };
        staked += 1.0;
        if m.total_goals() > 2 {
            returned += over;
        }
    }
    let flat_over_roi = if staked > 0.0 {
        Some((returned - staked) / staked)
    } else {
        None
    };

    Some(OverUnderReport {
        matches: matches.len(),
        overs,
        over_rate: overs as f64 / matches.len() as f64,
        avg_over_odds,
        avg_under_odds,
        flat_over_roi,
    })
}

/// Season-average 1X2 prices per bookmaker, for the comparison table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmakerAverages {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
    pub priced_matches: usize,
}

pub fn bookmaker_comparison(matches: &[MatchRecord]) -> BTreeMap<String, BookmakerAverages> {
    let mut sums: BTreeMap<String, ([f64; 3], [usize; 3], usize)> = BTreeMap::new();
    for m in matches {
        for (book, triple) in &m.odds.books {
            let entry = sums.entry(book.clone()).or_default();
            if !triple.is_empty() {
                entry.2 += 1;
            }
            for (slot, value) in [triple.home, triple.draw, triple.away].into_iter().enumerate() {
                if let Some(v) = value {
                    entry.0[slot] += v;
                    entry.1[slot] += 1;
                }
            }
        }
    }
    sums.into_iter()
        .map(|(book, (sum, n, priced))| {
            let avg = |idx: usize| {
                if n[idx] > 0 {
                    Some(sum[idx] / n[idx] as f64)
                } else {
                    None
                }
            };
            (
                book,
                BookmakerAverages {
                    home: avg(0),
                    draw: avg(1),
                    away: avg(2),
                    priced_matches: priced,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_matches;

    #[test]
    fn implied_probs_normalize_margin_away() {
        let triple = OddsTriple {
            home: Some(2.0),
            draw: Some(3.0),
            away: Some(4.0),
        };
        let probs = implied_probabilities(&triple).unwrap();
        assert!((probs.home - 0.4615).abs() < 1e-3);
        assert!((probs.draw - 0.3077).abs() < 1e-3);
        assert!((probs.away - 0.2308).abs() < 1e-3);
        assert!((probs.home + probs.draw + probs.away - 1.0).abs() < 1e-12);
        assert!((probs.overround - (0.5 + 1.0 / 3.0 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn implied_probs_missing_leg_is_none() {
        let triple = OddsTriple {
            home: Some(2.0),
            draw: None,
            away: Some(4.0),
        };
        assert!(implied_probabilities(&triple).is_none());
    }

    const HEADER: &str = "Div,Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HTHG,HTAG,HTR,HS,AS,HST,AST,HF,AF,HC,AC,HY,AY,HR,AR,Referee,AvgH,AvgD,AvgA,Avg>2.5,Avg<2.5";

    fn load(rows: &[&str]) -> Vec<MatchRecord> {
        parse_matches(&format!("{HEADER}\n{}\n", rows.join("\n"))).unwrap()
    }

    #[test]
    fn outcome_frequencies_sum_to_one() {
        let matches = load(&[
            "E0,16/08/2024,A,B,2,0,H,,,,,,,,,,,,,,,,R,,,,,",
            "E0,17/08/2024,C,D,1,1,D,,,,,,,,,,,,,,,,R,,,,,",
            "E0,18/08/2024,E,F,0,1,A,,,,,,,,,,,,,,,,R,,,,,",
            "E0,19/08/2024,G,H,3,1,H,,,,,,,,,,,,,,,,R,,,,,",
        ]);
        let freq = outcome_frequencies(&matches).unwrap();
        assert_eq!(freq.matches, 4);
        assert!((freq.home + freq.draw + freq.away - 1.0).abs() < 1e-12);
        assert!((freq.home - 0.5).abs() < 1e-12);
        assert!(outcome_frequencies(&[]).is_none());
    }

    #[test]
    fn value_bets_flag_large_edges_only() {
        // Three home wins make the home baseline 1.0; longshot home odds
        // of 5.0 imply ~0.31, an edge well above the 0.15 screen.
        let matches = load(&[
            "E0,16/08/2024,A,B,2,0,H,,,,,,,,,,,,,,,,R,5.00,4.00,1.60,,",
            "E0,17/08/2024,C,D,1,0,H,,,,,,,,,,,,,,,,R,,,,,",
            "E0,18/08/2024,E,F,3,1,H,,,,,,,,,,,,,,,,R,,,,,",
        ]);
        let params = AnalyticsParams::default();
        let bets = value_bets(&matches, &params);
        assert!(!bets.is_empty());
        let top = &bets[0];
        assert_eq!(top.outcome, MatchResult::HomeWin);
        assert!(top.edge > params.value_bet_edge);
        // Sorted by absolute edge descending.
        for pair in bets.windows(2) {
            assert!(pair[0].edge.abs() >= pair[1].edge.abs());
        }
    }

    #[test]
    fn over_under_roi_settles_at_match_prices() {
        let matches = load(&[
            // 3 goals: over wins at 1.90.
            "E0,16/08/2024,A,B,2,1,H,,,,,,,,,,,,,,,,R,,,,1.90,1.90",
            // 1 goal: over loses.
            "E0,17/08/2024,C,D,1,0,H,,,,,,,,,,,,,,,,R,,,,2.10,1.70",
            // Unpriced: not staked.
            "E0,18/08/2024,E,F,4,0,H,,,,,,,,,,,,,,,,R,,,,,",
        ]);
        let report = over_under_report(&matches).unwrap();
        assert_eq!(report.matches, 3);
        assert_eq!(report.overs, 2);
        assert!((report.over_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.avg_over_odds.unwrap() - 2.0).abs() < 1e-12);
        // Staked 2, returned 1.90.
        assert!((report.flat_over_roi.unwrap() - (1.90 - 2.0) / 2.0).abs() < 1e-12);
    }
}
