use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::{MatchRecord, OddsTriple};
use crate::params::AnalyticsParams;

/// Non-fatal findings. Rows are always retained; offending values are
/// recoded to missing where keeping them would poison aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataWarning {
    /// Same (date, home, away) triple appears more than once.
    DuplicateRecord {
        date: NaiveDate,
        home_team: String,
        away_team: String,
        rows: Vec<usize>,
    },
    /// A value that fails a range or consistency check.
    DataQuality {
        row: usize,
        field: String,
        detail: String,
    },
}

impl DataWarning {
    pub fn describe(&self) -> String {
        match self {
            Self::DuplicateRecord {
                date,
                home_team,
                away_team,
                rows,
            } => format!(
                "duplicate fixture {home_team} v {away_team} on {date} (rows {rows:?})"
            ),
            Self::DataQuality { row, field, detail } => {
                format!("row {row}: {field}: {detail}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub warnings: Vec<DataWarning>,
}

impl ValidationReport {
    pub fn duplicates(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, DataWarning::DuplicateRecord { .. }))
            .count()
    }

    pub fn quality_issues(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, DataWarning::DataQuality { .. }))
            .count()
    }
}

/// Range and consistency pass over freshly loaded records.
///
/// Mutations: negative goals are recoded to 0, negative count stats to
/// missing, and out-of-range odds to missing. Everything else only warns.
pub fn validate_matches(
    matches: &mut [MatchRecord],
    params: &AnalyticsParams,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut seen: HashMap<(NaiveDate, String, String), Vec<usize>> = HashMap::new();
    for m in matches.iter() {
        seen.entry((m.date, m.home_team.clone(), m.away_team.clone()))
            .or_default()
            .push(m.source_row);
    }
    let mut dupes: Vec<_> = seen
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .collect();
    dupes.sort_by_key(|(_, rows)| rows[0]);
    for ((date, home_team, away_team), rows) in dupes {
        report.warnings.push(DataWarning::DuplicateRecord {
            date,
            home_team,
            away_team,
            rows,
        });
    }

    for m in matches.iter_mut() {
        check_goals(m, &mut report);
        check_counts(m, &mut report);
        check_shots_consistency(m, &mut report);
        check_odds(m, params, &mut report);
    }

    report
}

fn check_goals(m: &mut MatchRecord, report: &mut ValidationReport) {
    for (field, value) in [("FTHG", &mut m.home_goals), ("FTAG", &mut m.away_goals)] {
        if *value < 0 {
            report.warnings.push(DataWarning::DataQuality {
                row: m.source_row,
                field: field.to_string(),
                detail: format!("negative goal count {value}, recoded to 0"),
            });
            *value = 0;
        }
    }
    for (field, value) in [("HTHG", &mut m.ht_home_goals), ("HTAG", &mut m.ht_away_goals)] {
        if let Some(v) = *value
            && v < 0
        {
            report.warnings.push(DataWarning::DataQuality {
                row: m.source_row,
                field: field.to_string(),
                detail: format!("negative goal count {v}, recoded to missing"),
            });
            *value = None;
        }
    }
}

fn check_counts(m: &mut MatchRecord, report: &mut ValidationReport) {
    let row = m.source_row;
    for (prefix, side) in [("H", &mut m.home), ("A", &mut m.away)] {
        let fields: [(&str, &mut Option<i64>); 6] = [
            ("S", &mut side.shots),
            ("ST", &mut side.shots_on_target),
            ("F", &mut side.fouls),
            ("C", &mut side.corners),
            ("Y", &mut side.yellows),
            ("R", &mut side.reds),
        ];
        for (suffix, value) in fields {
            if let Some(v) = *value
                && v < 0
            {
                report.warnings.push(DataWarning::DataQuality {
                    row,
                    field: format!("{prefix}{suffix}"),
                    detail: format!("negative count {v}, recoded to missing"),
                });
                *value = None;
            }
        }
    }
}

fn check_shots_consistency(m: &MatchRecord, report: &mut ValidationReport) {
    for (label, side) in [("home", &m.home), ("away", &m.away)] {
        if let (Some(shots), Some(on_target)) = (side.shots, side.shots_on_target)
            && on_target > shots
        {
            report.warnings.push(DataWarning::DataQuality {
                row: m.source_row,
                field: format!("{label} shots"),
                detail: format!("shots on target {on_target} exceeds total shots {shots}"),
            });
        }
    }
}

fn check_odds(m: &mut MatchRecord, params: &AnalyticsParams, report: &mut ValidationReport) {
    let row = m.source_row;
    let mut recode = |field: String, slot: &mut Option<f64>| {
        if let Some(v) = *slot
            && !params.odds_in_range(v)
        {
            report.warnings.push(DataWarning::DataQuality {
                row,
                field,
                detail: format!("odds {v} outside ({}, {})", params.odds_min, params.odds_max),
            });
            *slot = None;
        }
    };

    for (book, triple) in m.odds.books.iter_mut() {
        recode_triple(&mut recode, book, triple);
    }
    recode_triple(&mut recode, "BFE", &mut m.odds.exchange);
    recode_triple(&mut recode, "Avg", &mut m.odds.market_avg);
    recode_triple(&mut recode, "Max", &mut m.odds.market_max);
    recode("Avg>2.5".to_string(), &mut m.odds.avg_over25);
    recode("Avg<2.5".to_string(), &mut m.odds.avg_under25);
    recode("B365>2.5".to_string(), &mut m.odds.b365_over25);
    recode("B365<2.5".to_string(), &mut m.odds.b365_under25);
    recode("B365AHH".to_string(), &mut m.odds.b365_ah_home);
    recode("B365AHA".to_string(), &mut m.odds.b365_ah_away);
    // AHh is a handicap line, not a price; no range check.
}

fn recode_triple(
    recode: &mut impl FnMut(String, &mut Option<f64>),
    label: &str,
    triple: &mut OddsTriple,
) {
    recode(format!("{label}H"), &mut triple.home);
    recode(format!("{label}D"), &mut triple.draw);
    recode(format!("{label}A"), &mut triple.away);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_matches;

    const HEADER: &str = "Div,Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HTHG,HTAG,HTR,HS,AS,HST,AST,HF,AF,HC,AC,HY,AY,HR,AR,Referee,B365H,B365D,B365A,AvgH,AvgD,AvgA";

    fn load(rows: &[&str]) -> Vec<MatchRecord> {
        let csv = format!("{HEADER}\n{}\n", rows.join("\n"));
        parse_matches(&csv).unwrap()
    }

    #[test]
    fn duplicate_triple_is_warned_not_dropped() {
        let mut matches = load(&[
            "E0,16/08/2024,Arsenal,Wolves,2,0,H,,,,,,,,,,,,,,,,M Oliver,,,,,,",
            "E0,16/08/2024,Arsenal,Wolves,2,0,H,,,,,,,,,,,,,,,,M Oliver,,,,,,",
            "E0,17/08/2024,Chelsea,Fulham,1,1,D,,,,,,,,,,,,,,,,A Taylor,,,,,,",
        ]);
        let report = validate_matches(&mut matches, &AnalyticsParams::default());
        assert_eq!(matches.len(), 3);
        assert_eq!(report.duplicates(), 1);
        match &report.warnings[0] {
            DataWarning::DuplicateRecord { rows, .. } => assert_eq!(rows, &vec![1, 2]),
            other => panic!("unexpected warning {other:?}"),
        }
    }

    #[test]
    fn out_of_range_odds_recoded_missing() {
        let mut matches = load(&[
            "E0,16/08/2024,Arsenal,Wolves,2,0,H,,,,,,,,,,,,,,,,M Oliver,1.005,3.40,250.0,1.30,5.50,9.00",
        ]);
        let report = validate_matches(&mut matches, &AnalyticsParams::default());
        let b365 = matches[0].odds.books.get("B365").unwrap();
        assert_eq!(b365.home, None);
        assert_eq!(b365.draw, Some(3.40));
        assert_eq!(b365.away, None);
        assert!(matches[0].odds.market_avg.is_complete());
        assert_eq!(report.quality_issues(), 2);
    }

    #[test]
    fn shots_on_target_above_shots_warns_but_keeps_values() {
        let mut matches = load(&[
            "E0,16/08/2024,Arsenal,Wolves,2,0,H,,,,5,9,8,2,,,,,,,,,M Oliver,,,,,,",
        ]);
        let report = validate_matches(&mut matches, &AnalyticsParams::default());
        assert_eq!(report.quality_issues(), 1);
        assert_eq!(matches[0].home.shots_on_target, Some(8));
    }

    #[test]
    fn negative_counts_recoded_missing() {
        let mut matches = load(&[
            "E0,16/08/2024,Arsenal,Wolves,2,0,H,,,,-3,9,,,,,,,,,,,M Oliver,,,,,,",
        ]);
        let report = validate_matches(&mut matches, &AnalyticsParams::default());
        assert_eq!(matches[0].home.shots, None);
        assert_eq!(report.quality_issues(), 1);
    }
}
