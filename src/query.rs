use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clean::clean_matches;
use crate::dataset::{DatasetError, MatchRecord, load_matches};
use crate::h2h::{H2HRecord, WinProbability, h2h_record, win_probability};
use crate::odds::{
    BookmakerAverages, ImpliedProbs, OutcomeFrequencies, OverUnderReport, ValueBet,
    bookmaker_comparison, implied_probabilities, outcome_frequencies, over_under_report,
    value_bets,
};
use crate::params::AnalyticsParams;
use crate::referees::{RefereeRecord, referee_leaderboard, referee_record};
use crate::standings::{TeamDetail, TeamStanding, compute_standings, team_detail};
use crate::validate::{ValidationReport, validate_matches};

/// One row of the implied-probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchImplied {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    /// None when the market-average triple is incomplete.
    pub probs: Option<ImpliedProbs>,
}

struct Cached<T> {
    version: u64,
    computed_at: Instant,
    value: T,
}

impl<T: Clone> Cached<T> {
    fn get(entry: &Option<Self>, version: u64, ttl: Duration) -> Option<T> {
        let cached = entry.as_ref()?;
        if cached.version != version || cached.computed_at.elapsed() > ttl {
            return None;
        }
        Some(cached.value.clone())
    }

    fn store(entry: &mut Option<Self>, version: u64, value: T) -> T {
        *entry = Some(Cached {
            version,
            computed_at: Instant::now(),
            value: value.clone(),
        });
        value
    }
}

#[derive(Default)]
struct QueryCache {
    standings: Option<Cached<Vec<TeamStanding>>>,
    referees: Option<Cached<Vec<RefereeRecord>>>,
    frequencies: Option<Cached<Option<OutcomeFrequencies>>>,
    value_bets: Option<Cached<Vec<ValueBet>>>,
    over_under: Option<Cached<Option<OverUnderReport>>>,
    bookmakers: Option<Cached<BTreeMap<String, BookmakerAverages>>>,
    implied: Option<Cached<Vec<MatchImplied>>>,
    team_detail: HashMap<String, Option<Cached<Option<TeamDetail>>>>,
    h2h: HashMap<(String, String), Option<Cached<Option<H2HRecord>>>>,
    win_prob: HashMap<(String, String), Option<Cached<WinProbability>>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Owns one season's cleaned match set and memoizes the derived aggregates.
///
/// The dataset is immutable for the lifetime of a version; `reload`
/// replaces it and bumps the version, invalidating every cache entry.
/// Entries also expire after the configured TTL.
pub struct SeasonAnalytics {
    matches: Vec<MatchRecord>,
    params: AnalyticsParams,
    report: ValidationReport,
    version: u64,
    ttl: Duration,
    cache: QueryCache,
    stats: CacheStats,
}

impl SeasonAnalytics {
    pub fn from_csv_path(path: &Path, params: AnalyticsParams) -> Result<Self, DatasetError> {
        let matches = load_matches(path)?;
        Ok(Self::from_records(matches, params))
    }

    /// Run the validate/clean pipeline over already-parsed records.
    pub fn from_records(mut matches: Vec<MatchRecord>, params: AnalyticsParams) -> Self {
        let report = validate_matches(&mut matches, &params);
        clean_matches(&mut matches);
        let ttl = Duration::from_secs(params.cache_ttl_secs);
        Self {
            matches,
            params,
            report,
            version: 1,
            ttl,
            cache: QueryCache::default(),
            stats: CacheStats::default(),
        }
    }

    /// Replace the dataset (e.g. a fresh download of the season file).
    pub fn reload(&mut self, mut matches: Vec<MatchRecord>) {
        self.report = validate_matches(&mut matches, &self.params);
        clean_matches(&mut matches);
        self.matches = matches;
        self.version += 1;
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn params(&self) -> &AnalyticsParams {
        &self.params
    }

    pub fn validation_report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn dataset_version(&self) -> u64 {
        self.version
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    fn memo<T: Clone>(
        stats: &mut CacheStats,
        entry: &mut Option<Cached<T>>,
        version: u64,
        ttl: Duration,
        compute: impl FnOnce() -> T,
    ) -> T {
        if let Some(value) = Cached::get(entry, version, ttl) {
            stats.hits += 1;
            return value;
        }
        stats.misses += 1;
        Cached::store(entry, version, compute())
    }

    pub fn standings(&mut self) -> Vec<TeamStanding> {
        Self::memo(
            &mut self.stats,
            &mut self.cache.standings,
            self.version,
            self.ttl,
            || compute_standings(&self.matches, &self.params),
        )
    }

    pub fn team_detail(&mut self, team: &str) -> Result<TeamDetail, DatasetError> {
        let entry = self
            .cache
            .team_detail
            .entry(team.to_string())
            .or_default();
        let value = Self::memo(&mut self.stats, entry, self.version, self.ttl, || {
            team_detail(&self.matches, team, &self.params)
        });
        value.ok_or_else(|| DatasetError::InsufficientData {
            what: format!("team {team}"),
        })
    }

    /// Form string and momentum, riding the team-detail cache.
    pub fn team_form(&mut self, team: &str) -> Result<(String, Option<f64>), DatasetError> {
        let detail = self.team_detail(team)?;
        Ok((detail.form, detail.momentum))
    }

    pub fn referee_leaderboard(&mut self) -> Vec<RefereeRecord> {
        Self::memo(
            &mut self.stats,
            &mut self.cache.referees,
            self.version,
            self.ttl,
            || referee_leaderboard(&self.matches),
        )
    }

    pub fn referee_row(&mut self, referee: &str) -> Result<RefereeRecord, DatasetError> {
        // Single rows ride the leaderboard cache.
        self.referee_leaderboard()
            .into_iter()
            .find(|r| r.referee == referee)
            .or_else(|| referee_record(&self.matches, referee))
            .ok_or_else(|| DatasetError::InsufficientData {
                what: format!("referee {referee}"),
            })
    }

    pub fn h2h_summary(&mut self, team_a: &str, team_b: &str) -> Result<H2HRecord, DatasetError> {
        let entry = self.cache.h2h.entry(pair_key(team_a, team_b)).or_default();
        let value = Self::memo(&mut self.stats, entry, self.version, self.ttl, || {
            h2h_record(&self.matches, team_a, team_b)
        });
        // Records are cached in canonical orientation; flip on demand.
        let value = value.map(|rec| {
            if rec.team_a == team_a {
                rec
            } else {
                flip_h2h(rec)
            }
        });
        value.ok_or_else(|| DatasetError::InsufficientData {
            what: format!("meetings between {team_a} and {team_b}"),
        })
    }

    pub fn win_probability(&mut self, home_team: &str, away_team: &str) -> WinProbability {
        let key = (home_team.to_string(), away_team.to_string());
        let entry = self.cache.win_prob.entry(key).or_default();
        Self::memo(&mut self.stats, entry, self.version, self.ttl, || {
            win_probability(&self.matches, home_team, away_team, &self.params)
        })
    }

    pub fn outcome_frequencies(&mut self) -> Result<OutcomeFrequencies, DatasetError> {
        Self::memo(
            &mut self.stats,
            &mut self.cache.frequencies,
            self.version,
            self.ttl,
            || outcome_frequencies(&self.matches),
        )
        .ok_or_else(|| DatasetError::InsufficientData {
            what: "outcome frequencies of an empty season".to_string(),
        })
    }

    pub fn value_bets(&mut self) -> Vec<ValueBet> {
        Self::memo(
            &mut self.stats,
            &mut self.cache.value_bets,
            self.version,
            self.ttl,
            || value_bets(&self.matches, &self.params),
        )
    }

    pub fn over_under_report(&mut self) -> Result<OverUnderReport, DatasetError> {
        Self::memo(
            &mut self.stats,
            &mut self.cache.over_under,
            self.version,
            self.ttl,
            || over_under_report(&self.matches),
        )
        .ok_or_else(|| DatasetError::InsufficientData {
            what: "over/under report of an empty season".to_string(),
        })
    }

    pub fn bookmaker_comparison(&mut self) -> BTreeMap<String, BookmakerAverages> {
        Self::memo(
            &mut self.stats,
            &mut self.cache.bookmakers,
            self.version,
            self.ttl,
            || bookmaker_comparison(&self.matches),
        )
    }

    pub fn implied_table(&mut self) -> Vec<MatchImplied> {
        Self::memo(
            &mut self.stats,
            &mut self.cache.implied,
            self.version,
            self.ttl,
            || {
                self.matches
                    .iter()
                    .map(|m| MatchImplied {
                        date: m.date,
                        home_team: m.home_team.clone(),
                        away_team: m.away_team.clone(),
                        probs: implied_probabilities(&m.odds.market_avg),
                    })
                    .collect()
            },
        )
    }
}

fn pair_key(team_a: &str, team_b: &str) -> (String, String) {
    if team_a <= team_b {
        (team_a.to_string(), team_b.to_string())
    } else {
        (team_b.to_string(), team_a.to_string())
    }
}

fn flip_h2h(rec: H2HRecord) -> H2HRecord {
    H2HRecord {
        team_a: rec.team_b,
        team_b: rec.team_a,
        meetings: rec.meetings,
        team_a_wins: rec.team_b_wins,
        team_b_wins: rec.team_a_wins,
        draws: rec.draws,
        team_a_goals: rec.team_b_goals,
        team_b_goals: rec.team_a_goals,
        avg_market_odds: rec.avg_market_odds,
        team_a_market_prob: rec.team_b_market_prob,
        team_b_market_prob: rec.team_a_market_prob,
    }
}
