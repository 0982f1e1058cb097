use crate::dataset::MatchRecord;

const UNKNOWN_REFEREE: &str = "Unknown";

/// Missing-value policy, applied after validation:
///
/// - a single bookmaker's missing 1X2 odd takes the median of the other
///   bookmakers' odds for that outcome in the same row; all missing stays
///   missing
/// - exchange odds are never imputed (and never feed aggregates)
/// - missing referee becomes "Unknown"
/// - count stats are never imputed
///
/// Idempotent: a second pass finds nothing left to fill.
pub fn clean_matches(matches: &mut [MatchRecord]) {
    for m in matches.iter_mut() {
        fill_book_odds(m);
        if m.referee.is_none() {
            m.referee = Some(UNKNOWN_REFEREE.to_string());
        }
    }
}

fn fill_book_odds(m: &mut MatchRecord) {
    enum Outcome {
        Home,
        Draw,
        Away,
    }
    for outcome in [Outcome::Home, Outcome::Draw, Outcome::Away] {
        let pick = |t: &crate::dataset::OddsTriple| match outcome {
            Outcome::Home => t.home,
            Outcome::Draw => t.draw,
            Outcome::Away => t.away,
        };
        let present: Vec<f64> = m.odds.books.values().filter_map(&pick).collect();
        if present.is_empty() {
            continue;
        }
        let fill = median(&present);
        for triple in m.odds.books.values_mut() {
            let slot = match outcome {
                Outcome::Home => &mut triple.home,
                Outcome::Draw => &mut triple.draw,
                Outcome::Away => &mut triple.away,
            };
            if slot.is_none() {
                *slot = Some(fill);
            }
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}
