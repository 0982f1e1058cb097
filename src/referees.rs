use serde::{Deserialize, Serialize};

use crate::dataset::MatchRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefereeRecord {
    pub referee: String,
    pub matches: u32,
    pub yellows: i64,
    pub reds: i64,
    /// (yellows + reds) / matches with card data; None when no match
    /// recorded cards.
    pub cards_per_match: Option<f64>,
    pub fouls_per_match: Option<f64>,
}

/// Discipline leaderboard, most matches first. Cards/fouls averages only
/// count matches where both sides recorded the stat.
pub fn referee_leaderboard(matches: &[MatchRecord]) -> Vec<RefereeRecord> {
    let mut names: Vec<&str> = matches
        .iter()
        .filter_map(|m| m.referee.as_deref())
        .collect();
    names.sort();
    names.dedup();

    let mut out: Vec<RefereeRecord> = names
        .into_iter()
        .filter_map(|name| referee_record(matches, name))
        .collect();
    out.sort_by(|a, b| b.matches.cmp(&a.matches).then(a.referee.cmp(&b.referee)));
    out
}

/// None when the referee officiated nothing in this dataset.
pub fn referee_record(matches: &[MatchRecord], referee: &str) -> Option<RefereeRecord> {
    let mut rec = RefereeRecord {
        referee: referee.to_string(),
        matches: 0,
        yellows: 0,
        reds: 0,
        cards_per_match: None,
        fouls_per_match: None,
    };
    let mut card_matches = 0u32;
    let mut card_total = 0i64;
    let mut foul_matches = 0u32;
    let mut foul_total = 0i64;

    for m in matches {
        if m.referee.as_deref() != Some(referee) {
            continue;
        }
        rec.matches += 1;
        rec.yellows += m.home.yellows.unwrap_or(0) + m.away.yellows.unwrap_or(0);
        rec.reds += m.home.reds.unwrap_or(0) + m.away.reds.unwrap_or(0);

        if let (Some(hy), Some(ay), Some(hr), Some(ar)) =
            (m.home.yellows, m.away.yellows, m.home.reds, m.away.reds)
        {
            card_matches += 1;
            card_total += hy + ay + hr + ar;
        }
        if let (Some(hf), Some(af)) = (m.home.fouls, m.away.fouls) {
            foul_matches += 1;
            foul_total += hf + af;
        }
    }

    if rec.matches == 0 {
        return None;
    }
    if card_matches > 0 {
        rec.cards_per_match = Some(card_total as f64 / f64::from(card_matches));
    }
    if foul_matches > 0 {
        rec.fouls_per_match = Some(foul_total as f64 / f64::from(foul_matches));
    }
    Some(rec)
}
