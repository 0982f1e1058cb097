use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns the loader refuses to proceed without. Odds columns are optional;
/// features that need them report "no data" instead.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Div", "Date", "HomeTeam", "AwayTeam", "FTHG", "FTAG", "FTR", "HTHG", "HTAG", "HTR", "HS",
    "AS", "HST", "AST", "HF", "AF", "HC", "AC", "HY", "AY", "HR", "AR", "Referee",
];

/// Fixed-odds bookmakers carried per match. The Betfair Exchange block (BFE*)
/// is kept separately and never feeds aggregates.
pub const BOOKMAKERS: &[&str] = &["B365", "BW", "PS", "WH", "1XB", "BF"];

const EXCHANGE_PREFIX: &str = "BFE";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv parse error")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unparseable date {raw:?}")]
    BadDate { row: usize, raw: String },
    #[error("row {row}: unparseable full-time result (FTHG={fthg:?} FTAG={ftag:?} FTR={ftr:?})")]
    BadResult {
        row: usize,
        fthg: String,
        ftag: String,
        ftr: String,
    },
    #[error("no data available for {what}")]
    InsufficientData { what: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchResult {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(Self::HomeWin),
            "D" => Some(Self::Draw),
            "A" => Some(Self::AwayWin),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Self::HomeWin => 'H',
            Self::Draw => 'D',
            Self::AwayWin => 'A',
        }
    }

    fn from_goals(home: i64, away: i64) -> Self {
        if home > away {
            Self::HomeWin
        } else if home < away {
            Self::AwayWin
        } else {
            Self::Draw
        }
    }
}

/// A result from one team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamResult {
    Win,
    Draw,
    Loss,
}

impl TeamResult {
    pub fn letter(self) -> char {
        match self {
            Self::Win => 'W',
            Self::Draw => 'D',
            Self::Loss => 'L',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsTriple {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
}

impl OddsTriple {
    pub fn is_complete(&self) -> bool {
        self.home.is_some() && self.draw.is_some() && self.away.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_none() && self.draw.is_none() && self.away.is_none()
    }
}

/// Match-event counts for one side. Missing stays missing; downstream
/// averages skip `None` rather than treating it as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideCounts {
    pub shots: Option<i64>,
    pub shots_on_target: Option<i64>,
    pub fouls: Option<i64>,
    pub corners: Option<i64>,
    pub yellows: Option<i64>,
    pub reds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOdds {
    /// Per-bookmaker 1X2 triples, keyed by bookmaker code (B365, BW, ...).
    pub books: BTreeMap<String, OddsTriple>,
    /// Betfair Exchange 1X2; frequently empty, excluded from aggregates.
    pub exchange: OddsTriple,
    /// Market average (AvgH/AvgD/AvgA).
    pub market_avg: OddsTriple,
    /// Market maximum (MaxH/MaxD/MaxA).
    pub market_max: OddsTriple,
    pub avg_over25: Option<f64>,
    pub avg_under25: Option<f64>,
    pub b365_over25: Option<f64>,
    pub b365_under25: Option<f64>,
    /// Asian handicap line (home perspective), e.g. -0.5.
    pub ah_line: Option<f64>,
    pub b365_ah_home: Option<f64>,
    pub b365_ah_away: Option<f64>,
}

/// One fixture. Immutable once the pipeline has run; goals may carry raw
/// negative values straight after load until the validator recodes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 1-based data row in the source file, used in warning messages.
    pub source_row: usize,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: i64,
    pub away_goals: i64,
    pub result: MatchResult,
    pub ht_home_goals: Option<i64>,
    pub ht_away_goals: Option<i64>,
    pub ht_result: Option<MatchResult>,
    pub home: SideCounts,
    pub away: SideCounts,
    pub referee: Option<String>,
    pub odds: MatchOdds,
}

impl MatchRecord {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// W/D/L from `team`'s perspective, `None` when the team did not play.
    pub fn result_for(&self, team: &str) -> Option<TeamResult> {
        let is_home = if self.home_team == team {
            true
        } else if self.away_team == team {
            false
        } else {
            return None;
        };
        Some(match (self.result, is_home) {
            (MatchResult::Draw, _) => TeamResult::Draw,
            (MatchResult::HomeWin, true) | (MatchResult::AwayWin, false) => TeamResult::Win,
            _ => TeamResult::Loss,
        })
    }

    pub fn goals_for(&self, team: &str) -> Option<(i64, i64)> {
        if self.home_team == team {
            Some((self.home_goals, self.away_goals))
        } else if self.away_team == team {
            Some((self.away_goals, self.home_goals))
        } else {
            None
        }
    }

    pub fn total_goals(&self) -> i64 {
        self.home_goals + self.away_goals
    }
}

pub fn load_matches(path: &Path) -> Result<Vec<MatchRecord>, DatasetError> {
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_matches(&raw)
}

/// Parse a football-data.co.uk style season CSV. Tolerates a UTF-8 BOM on
/// the first header cell and blank trailing lines.
pub fn parse_matches(raw: &str) -> Result<Vec<MatchRecord>, DatasetError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader.headers()?.clone();
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        let name = name.trim().trim_start_matches('\u{feff}');
        columns.entry(name.to_string()).or_insert(idx);
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !columns.contains_key(**col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::Schema { missing });
    }

    let mut out = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        out.push(parse_row(&record, &columns, row)?);
    }
    Ok(out)
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    row: usize,
) -> Result<MatchRecord, DatasetError> {
    let cell = |name: &str| cell_value(record, columns, name);

    let raw_date = cell("Date");
    let date = parse_dayfirst_date(raw_date).ok_or_else(|| DatasetError::BadDate {
        row,
        raw: raw_date.to_string(),
    })?;

    let home_goals = parse_int(cell("FTHG"));
    let away_goals = parse_int(cell("FTAG"));
    let result = MatchResult::from_code(cell("FTR"))
        .or_else(|| match (home_goals, away_goals) {
            (Some(h), Some(a)) => Some(MatchResult::from_goals(h, a)),
            _ => None,
        });
    let (Some(home_goals), Some(away_goals), Some(result)) = (home_goals, away_goals, result)
    else {
        return Err(DatasetError::BadResult {
            row,
            fthg: cell("FTHG").to_string(),
            ftag: cell("FTAG").to_string(),
            ftr: cell("FTR").to_string(),
        });
    };

    let mut books = BTreeMap::new();
    for book in BOOKMAKERS {
        let triple = read_triple(record, columns, book);
        if !triple.is_empty() {
            books.insert(book.to_string(), triple);
        }
    }

    let referee = {
        let raw = cell("Referee");
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    };

    Ok(MatchRecord {
        source_row: row,
        date,
        home_team: cell("HomeTeam").to_string(),
        away_team: cell("AwayTeam").to_string(),
        home_goals,
        away_goals,
        result,
        ht_home_goals: parse_int(cell("HTHG")),
        ht_away_goals: parse_int(cell("HTAG")),
        ht_result: MatchResult::from_code(cell("HTR")),
        home: SideCounts {
            shots: parse_int(cell("HS")),
            shots_on_target: parse_int(cell("HST")),
            fouls: parse_int(cell("HF")),
            corners: parse_int(cell("HC")),
            yellows: parse_int(cell("HY")),
            reds: parse_int(cell("HR")),
        },
        away: SideCounts {
            shots: parse_int(cell("AS")),
            shots_on_target: parse_int(cell("AST")),
            fouls: parse_int(cell("AF")),
            corners: parse_int(cell("AC")),
            yellows: parse_int(cell("AY")),
            reds: parse_int(cell("AR")),
        },
        referee,
        odds: MatchOdds {
            books,
            exchange: read_triple(record, columns, EXCHANGE_PREFIX),
            market_avg: read_triple(record, columns, "Avg"),
            market_max: read_triple(record, columns, "Max"),
            avg_over25: parse_odds(cell("Avg>2.5")),
            avg_under25: parse_odds(cell("Avg<2.5")),
            b365_over25: parse_odds(cell("B365>2.5")),
            b365_under25: parse_odds(cell("B365<2.5")),
            ah_line: parse_odds_signed(cell("AHh")),
            b365_ah_home: parse_odds(cell("B365AHH")),
            b365_ah_away: parse_odds(cell("B365AHA")),
        },
    })
}

fn cell_value<'r>(
    record: &'r csv::StringRecord,
    columns: &HashMap<String, usize>,
    name: &str,
) -> &'r str {
    columns
        .get(name)
        .and_then(|idx| record.get(*idx))
        .map(str::trim)
        .unwrap_or("")
}

fn read_triple(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    prefix: &str,
) -> OddsTriple {
    OddsTriple {
        home: parse_odds(cell_value(record, columns, &format!("{prefix}H"))),
        draw: parse_odds(cell_value(record, columns, &format!("{prefix}D"))),
        away: parse_odds(cell_value(record, columns, &format!("{prefix}A"))),
    }
}

fn parse_dayfirst_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%y"))
        .ok()
}

fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return None;
    }
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|v| v as i64))
}

fn parse_odds(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

// Asian handicap lines are legitimately negative; plain odds are not, but the
// validator owns that judgement.
fn parse_odds_signed(raw: &str) -> Option<f64> {
    parse_odds(raw)
}

/// Sorted unique team names across both sides.
pub fn all_teams(matches: &[MatchRecord]) -> Vec<String> {
    let mut teams: Vec<String> = matches
        .iter()
        .flat_map(|m| [m.home_team.clone(), m.away_team.clone()])
        .collect();
    teams.sort();
    teams.dedup();
    teams
}

/// Sorted unique referee names (post-clean this includes "Unknown").
pub fn all_referees(matches: &[MatchRecord]) -> Vec<String> {
    let mut refs: Vec<String> = matches
        .iter()
        .filter_map(|m| m.referee.clone())
        .collect();
    refs.sort();
    refs.dedup();
    refs
}
