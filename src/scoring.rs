//! Scoring engine: validate a choice into a `Response`, aggregate a response
//! log, and derive the badge tier.
//!
//! Badge cutoffs are absolute on the cumulative total and are not normalized
//! by the number of responses, so enough low-scoring answers can still climb
//! a tier.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Dilemma, MAX_CHOICE_SCORE};
use crate::error::{Result, TrainerError};
use crate::session::{Response, ResponseContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    HighRiskZone,
    EthicsExplorer,
    RiskWatcher,
    IntegrityGuardian,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::HighRiskZone => "High-Risk Zone",
            Badge::EthicsExplorer => "Ethics Explorer",
            Badge::RiskWatcher => "Risk Watcher",
            Badge::IntegrityGuardian => "Integrity Guardian",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Badge::HighRiskZone => "⚠️",
            Badge::EthicsExplorer => "🧭",
            Badge::RiskWatcher => "🛡️",
            Badge::IntegrityGuardian => "🏆",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds (inclusive) of the three upper tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeCutoffs {
    pub guardian: u32,
    pub watcher: u32,
    pub explorer: u32,
}

impl Default for BadgeCutoffs {
    fn default() -> Self {
        Self { guardian: 10, watcher: 7, explorer: 4 }
    }
}

impl BadgeCutoffs {
    pub fn new(guardian: u32, watcher: u32, explorer: u32) -> std::result::Result<Self, String> {
        if guardian > watcher && watcher > explorer {
            Ok(Self { guardian, watcher, explorer })
        } else {
            Err(format!(
                "cutoffs must be strictly descending, got {}/{}/{}",
                guardian, watcher, explorer
            ))
        }
    }

    pub fn badge_for(&self, total: u32) -> Badge {
        if total >= self.guardian {
            Badge::IntegrityGuardian
        } else if total >= self.watcher {
            Badge::RiskWatcher
        } else if total >= self.explorer {
            Badge::EthicsExplorer
        } else {
            Badge::HighRiskZone
        }
    }
}

/// Badge under the default 4/7/10 cutoffs.
pub fn derive_badge(total: u32) -> Badge {
    BadgeCutoffs::default().badge_for(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Aggregate {
    pub total: u32,
    pub max_possible: u32,
}

pub fn aggregate(responses: &[Response]) -> Aggregate {
    Aggregate {
        total: responses.iter().map(|r| u32::from(r.score)).sum(),
        max_possible: responses.len() as u32 * u32::from(MAX_CHOICE_SCORE),
    }
}

/// What the presenter may show after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Progress {
    Locked { remaining: usize },
    Unlocked { aggregate: Aggregate, badge: Badge },
}

impl Progress {
    pub fn message(&self) -> String {
        match self {
            Progress::Locked { remaining } => format!(
                "Answer more dilemmas to unlock your running score and status badge. {} more to go!",
                remaining
            ),
            Progress::Unlocked { aggregate, badge } => format!(
                "Score {} / {} · {} {}",
                aggregate.total,
                aggregate.max_possible,
                badge.icon(),
                badge.label()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorePolicy {
    pub min_responses: usize,
    pub cutoffs: BadgeCutoffs,
}

impl ScorePolicy {
    pub const DEFAULT_MIN_RESPONSES: usize = 5;

    pub fn progress(&self, responses: &[Response]) -> Progress {
        let count = responses.len();
        if count < self.min_responses {
            return Progress::Locked { remaining: self.min_responses - count };
        }
        let aggregate = aggregate(responses);
        Progress::Unlocked { aggregate, badge: self.cutoffs.badge_for(aggregate.total) }
    }
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            min_responses: Self::DEFAULT_MIN_RESPONSES,
            cutoffs: BadgeCutoffs::default(),
        }
    }
}

/// Match `choice_key` against the dilemma and build the response. The caller
/// appends it to the session log.
pub fn submit_choice(dilemma: &Dilemma, choice_key: &str, ctx: &ResponseContext) -> Result<Response> {
    submit_choice_at(dilemma, choice_key, ctx, Utc::now())
}

pub fn submit_choice_at(
    dilemma: &Dilemma,
    choice_key: &str,
    ctx: &ResponseContext,
    now: DateTime<Utc>,
) -> Result<Response> {
    let choice = dilemma.choice(choice_key).ok_or_else(|| TrainerError::UnknownChoiceKey {
        dilemma_id: dilemma.id.clone(),
        key: choice_key.to_string(),
    })?;
    Ok(Response {
        session_id: ctx.session_id.clone(),
        timestamp: now,
        dilemma_id: dilemma.id.clone(),
        choice_key: choice.key.clone(),
        score: choice.score,
        feedback: choice.feedback.clone(),
        role: ctx.profile.role,
        region: ctx.profile.region,
        tags: ctx.profile.tags.clone(),
        first_click_latency: ctx.first_click_latency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::session::{Profile, SessionId};

    fn ctx() -> ResponseContext {
        ResponseContext {
            session_id: SessionId::from("s-1"),
            profile: Profile::default(),
            first_click_latency: Some(1.25),
        }
    }

    fn responses(scores: &[u8]) -> Vec<Response> {
        let cat = Catalog::builtin().unwrap();
        let d = cat.get_by_id("bribe_supervisor_email").unwrap();
        scores
            .iter()
            .map(|&s| {
                let key = d.choices.iter().find(|c| c.score == s).unwrap().key.clone();
                submit_choice(d, &key, &ctx()).unwrap()
            })
            .collect()
    }

    #[test]
    fn aggregate_empty_is_zero() {
        assert_eq!(aggregate(&[]), Aggregate { total: 0, max_possible: 0 });
    }

    #[test]
    fn max_possible_is_three_per_response() {
        let cases: [&[u8]; 4] = [&[0], &[0, 0, 0], &[3, 1, 2, 0], &[3, 3, 3, 3, 3]];
        for scores in cases {
            let agg = aggregate(&responses(scores));
            assert_eq!(agg.max_possible, 3 * scores.len() as u32);
            assert_eq!(agg.total, scores.iter().map(|&s| s as u32).sum::<u32>());
        }
    }

    #[test]
    fn badge_boundaries() {
        assert_eq!(derive_badge(0), Badge::HighRiskZone);
        assert_eq!(derive_badge(3), Badge::HighRiskZone);
        assert_eq!(derive_badge(4), Badge::EthicsExplorer);
        assert_eq!(derive_badge(6), Badge::EthicsExplorer);
        assert_eq!(derive_badge(7), Badge::RiskWatcher);
        assert_eq!(derive_badge(9), Badge::RiskWatcher);
        assert_eq!(derive_badge(10), Badge::IntegrityGuardian);
        assert_eq!(derive_badge(10).to_string(), "Integrity Guardian");
    }

    #[test]
    fn badge_is_monotonic() {
        let mut prev = derive_badge(0);
        for total in 1..=60 {
            let b = derive_badge(total);
            assert!(b >= prev, "tier dropped at {}", total);
            prev = b;
        }
    }

    #[test]
    fn badge_counts_volume_not_ratio() {
        // Ten answers worth one point each still reach the top tier.
        let agg = aggregate(&responses(&[1; 10]));
        assert_eq!(agg, Aggregate { total: 10, max_possible: 30 });
        assert_eq!(derive_badge(agg.total), Badge::IntegrityGuardian);
    }

    #[test]
    fn progress_locked_until_threshold() {
        let policy = ScorePolicy::default();
        assert_eq!(policy.progress(&[]), Progress::Locked { remaining: 5 });
        assert_eq!(policy.progress(&responses(&[3, 3, 3, 3])), Progress::Locked { remaining: 1 });
        let unlocked = policy.progress(&responses(&[3, 3, 3, 3, 0]));
        assert_eq!(
            unlocked,
            Progress::Unlocked {
                aggregate: Aggregate { total: 12, max_possible: 15 },
                badge: Badge::IntegrityGuardian,
            }
        );
        assert!(unlocked.message().contains("12 / 15"));
    }

    #[test]
    fn zero_threshold_always_unlocked() {
        let policy = ScorePolicy { min_responses: 0, ..ScorePolicy::default() };
        assert!(matches!(policy.progress(&[]), Progress::Unlocked { .. }));
        assert!(Progress::Locked { remaining: 2 }.message().contains("2 more to go"));
    }

    #[test]
    fn submit_copies_choice_and_context() {
        let cat = Catalog::builtin().unwrap();
        let d = cat.get_by_id("gift_vendor_conference").unwrap();
        let r = submit_choice(d, "D", &ctx()).unwrap();
        assert_eq!(r.dilemma_id, "gift_vendor_conference");
        assert_eq!(r.choice_key, "D");
        assert_eq!(r.score, 0);
        assert_eq!(r.feedback, d.choice("D").unwrap().feedback);
        assert_eq!(r.first_click_latency, Some(1.25));
        assert_eq!(r.session_id.as_str(), "s-1");
    }

    #[test]
    fn submit_rejects_unknown_key() {
        let cat = Catalog::builtin().unwrap();
        let d = cat.get_by_id("gift_vendor_conference").unwrap();
        let err = submit_choice(d, "Z", &ctx()).unwrap_err();
        assert_eq!(
            err,
            TrainerError::UnknownChoiceKey {
                dilemma_id: "gift_vendor_conference".to_string(),
                key: "Z".to_string(),
            }
        );
    }
}
