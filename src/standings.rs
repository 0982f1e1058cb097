use serde::{Deserialize, Serialize};

use crate::dataset::{MatchRecord, TeamResult, all_teams};
use crate::params::AnalyticsParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub position: usize,
    pub team: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_difference: i64,
    pub points: u32,
    /// Last min(5, played) results, chronological, most recent last.
    pub form: String,
    /// True when fewer matches than the form window have been played.
    pub form_incomplete: bool,
    /// Recency-weighted form score in [0, 3]; None for zero matches.
    pub momentum: Option<f64>,
}

/// Full league table: points desc, then goal difference, then goals for.
pub fn compute_standings(matches: &[MatchRecord], params: &AnalyticsParams) -> Vec<TeamStanding> {
    let mut rows: Vec<TeamStanding> = all_teams(matches)
        .into_iter()
        .map(|team| standing_for_team(matches, &team, params))
        .collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_difference.cmp(&a.goal_difference))
            .then(b.goals_for.cmp(&a.goals_for))
            .then(a.team.cmp(&b.team))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = idx + 1;
    }
    rows
}

fn standing_for_team(
    matches: &[MatchRecord],
    team: &str,
    params: &AnalyticsParams,
) -> TeamStanding {
    let mut played = 0u32;
    let mut wins = 0u32;
    let mut draws = 0u32;
    let mut losses = 0u32;
    let mut goals_for = 0i64;
    let mut goals_against = 0i64;

    for m in matches {
        let Some(result) = m.result_for(team) else {
            continue;
        };
        played += 1;
        match result {
            TeamResult::Win => wins += 1,
            TeamResult::Draw => draws += 1,
            TeamResult::Loss => losses += 1,
        }
        if let Some((gf, ga)) = m.goals_for(team) {
            goals_for += gf;
            goals_against += ga;
        }
    }

    let points = wins * params.points_win + draws * params.points_draw + losses * params.points_loss;
    let form = form_for_team(matches, team, params.form_window);

    TeamStanding {
        position: 0,
        team: team.to_string(),
        played,
        wins,
        draws,
        losses,
        goals_for,
        goals_against,
        goal_difference: goals_for - goals_against,
        points,
        form_incomplete: (played as usize) < params.form_window,
        momentum: momentum_score(matches, team, params),
        form,
    }
}

/// Results of a team's matches in date order (stable on source order for
/// same-day fixtures).
pub fn results_in_order(matches: &[MatchRecord], team: &str) -> Vec<TeamResult> {
    let mut played: Vec<&MatchRecord> = matches.iter().filter(|m| m.involves(team)).collect();
    played.sort_by(|a, b| a.date.cmp(&b.date).then(a.source_row.cmp(&b.source_row)));
    played
        .iter()
        .filter_map(|m| m.result_for(team))
        .collect()
}

/// Form string: last `window` results, chronological, most recent last.
pub fn form_for_team(matches: &[MatchRecord], team: &str, window: usize) -> String {
    let results = results_in_order(matches, team);
    let skip = results.len().saturating_sub(window);
    results[skip..].iter().map(|r| r.letter()).collect()
}

/// Recency-weighted mean of the last-window point hauls. The most recent
/// match carries weight `window`, the oldest in the window weight 1; the
/// weighted sum is divided by the weight total, so the score lies in
/// [0, points_win]. None when the team has no matches.
pub fn momentum_score(
    matches: &[MatchRecord],
    team: &str,
    params: &AnalyticsParams,
) -> Option<f64> {
    let results = results_in_order(matches, team);
    if results.is_empty() {
        return None;
    }
    let skip = results.len().saturating_sub(params.form_window);
    let recent = &results[skip..];

    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for (idx, result) in recent.iter().enumerate() {
        // Oldest-in-window has weight 1, most recent has weight len().
        let weight = (idx + 1) as f64;
        weighted += weight * f64::from(params.points_for(*result));
        weight_sum += weight;
    }
    Some(weighted / weight_sum)
}

/// Per-venue aggregate detail for one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueStats {
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: i64,
    pub goals_against: i64,
    pub points: u32,
    pub clean_sheets: u32,
    pub win_rate: Option<f64>,
    pub avg_goals_for: Option<f64>,
    pub avg_goals_against: Option<f64>,
    /// Averages over matches where the count was recorded.
    pub avg_shots: Option<f64>,
    pub avg_fouls: Option<f64>,
    pub avg_corners: Option<f64>,
    /// Shots on target / shots, over matches with both recorded.
    pub shot_accuracy: Option<f64>,
    pub yellows: i64,
    pub reds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDetail {
    pub team: String,
    pub overall: VenueStats,
    pub home: VenueStats,
    pub away: VenueStats,
    pub form: String,
    pub momentum: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
    Any,
}

pub fn team_detail(
    matches: &[MatchRecord],
    team: &str,
    params: &AnalyticsParams,
) -> Option<TeamDetail> {
    if !matches.iter().any(|m| m.involves(team)) {
        return None;
    }
    Some(TeamDetail {
        team: team.to_string(),
        overall: venue_stats(matches, team, Venue::Any, params),
        home: venue_stats(matches, team, Venue::Home, params),
        away: venue_stats(matches, team, Venue::Away, params),
        form: form_for_team(matches, team, params.form_window),
        momentum: momentum_score(matches, team, params),
    })
}

pub fn venue_stats(
    matches: &[MatchRecord],
    team: &str,
    venue: Venue,
    params: &AnalyticsParams,
) -> VenueStats {
    let mut out = VenueStats::default();
    let mut shots_sum = 0i64;
    let mut shots_n = 0u32;
    let mut sot_sum = 0i64;
    let mut both_shots_sum = 0i64;
    let mut fouls_sum = 0i64;
    let mut fouls_n = 0u32;
    let mut corners_sum = 0i64;
    let mut corners_n = 0u32;

    for m in matches {
        let is_home = m.home_team == team;
        let is_away = m.away_team == team;
        let include = match venue {
            Venue::Home => is_home,
            Venue::Away => is_away,
            Venue::Any => is_home || is_away,
        };
        if !include {
            continue;
        }
        let Some(result) = m.result_for(team) else {
            continue;
        };
        let Some((gf, ga)) = m.goals_for(team) else {
            continue;
        };
        let counts = if is_home { &m.home } else { &m.away };

        out.played += 1;
        match result {
            TeamResult::Win => out.wins += 1,
            TeamResult::Draw => out.draws += 1,
            TeamResult::Loss => out.losses += 1,
        }
        out.goals_for += gf;
        out.goals_against += ga;
        if ga == 0 {
            out.clean_sheets += 1;
        }
        if let Some(s) = counts.shots {
            shots_sum += s;
            shots_n += 1;
            // Accuracy needs both values from the same match.
            if let Some(t) = counts.shots_on_target {
                sot_sum += t;
                both_shots_sum += s;
            }
        }
        if let Some(f) = counts.fouls {
            fouls_sum += f;
            fouls_n += 1;
        }
        if let Some(c) = counts.corners {
            corners_sum += c;
            corners_n += 1;
        }
        out.yellows += counts.yellows.unwrap_or(0);
        out.reds += counts.reds.unwrap_or(0);
    }

    out.points =
        out.wins * params.points_win + out.draws * params.points_draw + out.losses * params.points_loss;
    if out.played > 0 {
        let n = f64::from(out.played);
        out.win_rate = Some(f64::from(out.wins) / n);
        out.avg_goals_for = Some(out.goals_for as f64 / n);
        out.avg_goals_against = Some(out.goals_against as f64 / n);
    }
    if shots_n > 0 {
        out.avg_shots = Some(shots_sum as f64 / f64::from(shots_n));
    }
    if fouls_n > 0 {
        out.avg_fouls = Some(fouls_sum as f64 / f64::from(fouls_n));
    }
    if corners_n > 0 {
        out.avg_corners = Some(corners_sum as f64 / f64::from(corners_n));
    }
    if both_shots_sum > 0 {
        out.shot_accuracy = Some(sot_sum as f64 / both_shots_sum as f64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_matches;

    const HEADER: &str = "Div,Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HTHG,HTAG,HTR,HS,AS,HST,AST,HF,AF,HC,AC,HY,AY,HR,AR,Referee";

    fn load(rows: &[&str]) -> Vec<MatchRecord> {
        parse_matches(&format!("{HEADER}\n{}\n", rows.join("\n"))).unwrap()
    }

    fn blank_tail() -> &'static str {
        ",,,,,,,,,,,,,,,,M Oliver"
    }

    #[test]
    fn three_match_scenario_points_and_form() {
        // Win 2-0, draw 1-1, loss 0-3.
        let matches = load(&[
            &format!("E0,16/08/2024,Team X,Alpha,2,0,H{}", blank_tail()),
            &format!("E0,23/08/2024,Beta,Team X,1,1,D{}", blank_tail()),
            &format!("E0,30/08/2024,Team X,Gamma,0,3,A{}", blank_tail()),
        ]);
        let params = AnalyticsParams::default();
        let standings = compute_standings(&matches, &params);
        let x = standings.iter().find(|s| s.team == "Team X").unwrap();
        assert_eq!(x.points, 4);
        assert_eq!(x.goals_for, 3);
        assert_eq!(x.goals_against, 4);
        assert_eq!(x.goal_difference, -1);
        assert_eq!(x.form, "WDL");
        assert!(x.form_incomplete);
        assert_eq!((x.wins, x.draws, x.losses), (1, 1, 1));
    }

    #[test]
    fn standings_invariants_hold() {
        let matches = load(&[
            &format!("E0,16/08/2024,A,B,2,1,H{}", blank_tail()),
            &format!("E0,17/08/2024,C,D,0,0,D{}", blank_tail()),
            &format!("E0,24/08/2024,B,C,3,1,H{}", blank_tail()),
            &format!("E0,25/08/2024,D,A,2,2,D{}", blank_tail()),
            &format!("E0,31/08/2024,A,C,1,0,H{}", blank_tail()),
        ]);
        let params = AnalyticsParams::default();
        let standings = compute_standings(&matches, &params);
        for row in &standings {
            assert_eq!(row.points, 3 * row.wins + row.draws);
            assert_eq!(row.wins + row.draws + row.losses, row.played);
            assert_eq!(row.goal_difference, row.goals_for - row.goals_against);
            assert_eq!(row.form.len() as u32, row.played.min(5));
        }
        for pair in standings.windows(2) {
            assert!(pair[0].points >= pair[1].points);
            if pair[0].points == pair[1].points {
                assert!(pair[0].goal_difference >= pair[1].goal_difference);
            }
        }
    }

    #[test]
    fn form_is_chronological_most_recent_last() {
        let matches = load(&[
            &format!("E0,01/09/2024,T,A,1,0,H{}", blank_tail()),
            &format!("E0,08/09/2024,A,T,2,0,H{}", blank_tail()),
            &format!("E0,15/09/2024,T,B,1,1,D{}", blank_tail()),
            &format!("E0,22/09/2024,B,T,0,1,A{}", blank_tail()),
            &format!("E0,29/09/2024,T,C,0,2,A{}", blank_tail()),
            &format!("E0,06/10/2024,C,T,3,3,D{}", blank_tail()),
        ]);
        // Full sequence: W L D W L D; window of 5 keeps L D W L D.
        assert_eq!(form_for_team(&matches, "T", 5), "LDWLD");
    }

    #[test]
    fn momentum_bounds_and_recency() {
        let params = AnalyticsParams::default();
        let all_wins = load(&[
            &format!("E0,01/09/2024,T,A,1,0,H{}", blank_tail()),
            &format!("E0,08/09/2024,T,B,1,0,H{}", blank_tail()),
        ]);
        assert_eq!(momentum_score(&all_wins, "T", &params), Some(3.0));

        // Recent win outweighs an equally-sized old win in the weighting:
        // W then L scores lower than L then W.
        let win_first = load(&[
            &format!("E0,01/09/2024,T,A,1,0,H{}", blank_tail()),
            &format!("E0,08/09/2024,T,B,0,1,A{}", blank_tail()),
        ]);
        let win_last = load(&[
            &format!("E0,01/09/2024,T,A,0,1,A{}", blank_tail()),
            &format!("E0,08/09/2024,T,B,1,0,H{}", blank_tail()),
        ]);
        let early = momentum_score(&win_first, "T", &params).unwrap();
        let late = momentum_score(&win_last, "T", &params).unwrap();
        assert!(late > early);
        assert!(early >= 0.0 && late <= 3.0);

        assert_eq!(momentum_score(&all_wins, "Nobody", &params), None);
    }

    #[test]
    fn venue_splits_skip_missing_counts() {
        let matches = load(&[
            "E0,16/08/2024,T,A,2,0,H,,,,10,4,5,2,,,,,,,,,M Oliver",
            &format!("E0,23/08/2024,A,T,1,1,D{}", blank_tail()),
        ]);
        let params = AnalyticsParams::default();
        let detail = team_detail(&matches, "T", &params).unwrap();
        assert_eq!(detail.overall.played, 2);
        // Only the first match recorded shots.
        assert_eq!(detail.overall.avg_shots, Some(10.0));
        assert_eq!(detail.overall.shot_accuracy, Some(0.5));
        assert_eq!(detail.home.clean_sheets, 1);
        assert_eq!(detail.away.played, 1);
        assert!(team_detail(&matches, "Nobody", &params).is_none());
    }
}
