use std::path::PathBuf;

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::scoring::{BadgeCutoffs, ScorePolicy};

#[derive(Debug, Clone)]
pub struct Config {
    /// Responses needed before the running score and badge are shown.
    pub min_responses: usize,
    pub badge_guardian: u32,
    pub badge_watcher: u32,
    pub badge_explorer: u32,
    /// Replaces the built-in catalog when set.
    pub catalog_path: Option<PathBuf>,
    pub share_base: String,
    pub utm_source: String,
    pub utm_campaign: String,
    pub export_path: PathBuf,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let cutoffs = BadgeCutoffs::default();
        Self {
            min_responses: ScorePolicy::DEFAULT_MIN_RESPONSES,
            badge_guardian: cutoffs.guardian,
            badge_watcher: cutoffs.watcher,
            badge_explorer: cutoffs.explorer,
            catalog_path: None,
            share_base: "http://localhost:8501/".to_string(),
            utm_source: "linkedin".to_string(),
            utm_campaign: "mvp_post".to_string(),
            export_path: PathBuf::from("redline_simulator_session.csv"),
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            min_responses: std::env::var("REDLINE_MIN_RESPONSES").ok().and_then(|v| v.parse().ok()).unwrap_or(d.min_responses),
            badge_guardian: std::env::var("REDLINE_BADGE_GUARDIAN").ok().and_then(|v| v.parse().ok()).unwrap_or(d.badge_guardian),
            badge_watcher: std::env::var("REDLINE_BADGE_WATCHER").ok().and_then(|v| v.parse().ok()).unwrap_or(d.badge_watcher),
            badge_explorer: std::env::var("REDLINE_BADGE_EXPLORER").ok().and_then(|v| v.parse().ok()).unwrap_or(d.badge_explorer),
            catalog_path: std::env::var("REDLINE_CATALOG").ok().map(PathBuf::from),
            share_base: std::env::var("REDLINE_SHARE_BASE").unwrap_or(d.share_base),
            utm_source: std::env::var("REDLINE_UTM_SOURCE").unwrap_or(d.utm_source),
            utm_campaign: std::env::var("REDLINE_UTM_CAMPAIGN").unwrap_or(d.utm_campaign),
            export_path: std::env::var("REDLINE_EXPORT_PATH").map(PathBuf::from).unwrap_or(d.export_path),
            seed: std::env::var("REDLINE_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }

    /// Scoring policy from the configured cutoffs. Cutoffs that are not
    /// strictly descending fall back to the defaults.
    pub fn score_policy(&self) -> ScorePolicy {
        let cutoffs = match BadgeCutoffs::new(self.badge_guardian, self.badge_watcher, self.badge_explorer) {
            Ok(c) => c,
            Err(reason) => {
                log(
                    Level::Warn,
                    Domain::System,
                    "config_fallback",
                    obj(&[("field", v_str("badge_cutoffs")), ("reason", v_str(&reason))]),
                );
                BadgeCutoffs::default()
            }
        };
        ScorePolicy { min_responses: self.min_responses, cutoffs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_policy() {
        let policy = Config::default().score_policy();
        assert_eq!(policy, ScorePolicy::default());
        assert_eq!(policy.min_responses, 5);
    }

    #[test]
    fn non_descending_cutoffs_fall_back() {
        let cfg = Config {
            badge_guardian: 5,
            badge_watcher: 7,
            ..Config::default()
        };
        assert_eq!(cfg.score_policy().cutoffs, BadgeCutoffs::default());
    }

    #[test]
    fn custom_cutoffs_are_used() {
        let cfg = Config {
            min_responses: 2,
            badge_guardian: 20,
            badge_watcher: 12,
            badge_explorer: 6,
            ..Config::default()
        };
        let policy = cfg.score_policy();
        assert_eq!(policy.min_responses, 2);
        assert_eq!(policy.cutoffs.guardian, 20);
    }
}
