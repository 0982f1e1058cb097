use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables consumed by the feature engine. Owned by the host application;
/// the defaults mirror the reference dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsParams {
    pub odds_min: f64,
    pub odds_max: f64,
    pub form_window: usize,
    pub points_win: u32,
    pub points_draw: u32,
    pub points_loss: u32,
    // |implied - observed league frequency| above this flags a value-bet candidate.
    pub value_bet_edge: f64,
    // Fixed draw share carved out of the two-team win probability split.
    pub draw_base: f64,
    pub weight_form: f64,
    pub weight_h2h: f64,
    pub weight_home_adv: f64,
    pub weight_market: f64,
    pub home_adv_split: f64,
    pub cache_ttl_secs: u64,
}

impl Default for AnalyticsParams {
    fn default() -> Self {
        Self {
            odds_min: 1.01,
            odds_max: 100.0,
            form_window: 5,
            points_win: 3,
            points_draw: 1,
            points_loss: 0,
            value_bet_edge: 0.15,
            draw_base: 0.25,
            weight_form: 0.40,
            weight_h2h: 0.30,
            weight_home_adv: 0.15,
            weight_market: 0.15,
            home_adv_split: 0.60,
            cache_ttl_secs: 3600,
        }
    }
}

impl AnalyticsParams {
    pub fn points_for(&self, result: crate::dataset::TeamResult) -> u32 {
        match result {
            crate::dataset::TeamResult::Win => self.points_win,
            crate::dataset::TeamResult::Draw => self.points_draw,
            crate::dataset::TeamResult::Loss => self.points_loss,
        }
    }

    pub fn odds_in_range(&self, value: f64) -> bool {
        value > self.odds_min && value < self.odds_max
    }
}

pub fn load_params(path: &Path) -> Result<AnalyticsParams> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read params file {}", path.display()))?;
    serde_json::from_str(&raw).context("parse params json")
}

pub fn save_params(path: &Path, params: &AnalyticsParams) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(params).context("serialize params")?;
    fs::write(&tmp, json).context("write params")?;
    fs::rename(&tmp, path).context("swap params")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_blend_weights_sum_to_one() {
        let p = AnalyticsParams::default();
        let sum = p.weight_form + p.weight_h2h + p.weight_home_adv + p.weight_market;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn odds_range_is_exclusive() {
        let p = AnalyticsParams::default();
        assert!(!p.odds_in_range(1.01));
        assert!(p.odds_in_range(1.02));
        assert!(!p.odds_in_range(100.0));
    }
}
