//! # Feedback Calibrator
//! Converts user feedback events into scalar confidence adjustments and
//! accumulates them per user. The stored running sum is deliberately
//! unclipped raw history; clipping happens only where the fusion engine
//! applies it to a score.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::assessment::RiskLevel;

/// Small positive adjustment when the user confirms an assessment.
const CONFIRM_BOOST: f32 = 0.05;
/// Larger negative adjustment when the user rejects one.
const REJECT_PENALTY: f32 = -0.10;
/// Per-level-difference adjustment for explicit corrections.
const ADJUST_FACTOR: f32 = 0.03;

/// What kind of feedback the user gave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Confirm,
    Reject,
    Adjust,
}

/// One feedback event targeting a prior assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    /// Optional relevance rating 1–5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u8>,
    /// For `adjust`: the level the user says it should have been.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_level: Option<RiskLevel>,
    /// Level of the assessment the event targets.
    pub prior_assessment_level: RiskLevel,
}

/// Per-user calibration state: running sum of all event adjustments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackState {
    pub net_adjustment: f32,
}

/// Aggregate feedback statistics for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub total: usize,
    pub confirm_rate: f32,
    pub avg_relevance: f32,
    pub net_adjustment: f32,
}

/// Compute the scalar adjustment for one event, rounded to 4 decimals.
///
/// - `confirm`: `+0.05`, scaled down by `relevance/5` when given.
/// - `reject`: `-0.10`, scaled by `1 - relevance/5` when given (a rejection
///   rated highly relevant barely penalizes).
/// - `adjust`: `0.03 * (target index - original index)`, can be negative.
/// - anything else (e.g. `adjust` without a target): `0.0`.
pub fn adjustment_for(event: &FeedbackEvent) -> f32 {
    let adj = match event.kind {
        FeedbackKind::Confirm => match event.relevance {
            Some(r) => CONFIRM_BOOST * (f32::from(r) / 5.0),
            None => CONFIRM_BOOST,
        },
        FeedbackKind::Reject => match event.relevance {
            Some(r) => REJECT_PENALTY * (1.0 - f32::from(r) / 5.0),
            None => REJECT_PENALTY,
        },
        FeedbackKind::Adjust => match event.target_level {
            Some(target) => {
                let diff = target.index() - event.prior_assessment_level.index();
                ADJUST_FACTOR * diff as f32
            }
            None => 0.0,
        },
    };
    round4(adj)
}

/// Thread-safe per-user feedback accumulator.
///
/// The read-modify-write of one user's state happens under a single lock
/// acquisition, so concurrent submissions for the same user cannot lose
/// updates.
#[derive(Debug, Default)]
pub struct FeedbackStore {
    inner: Mutex<HashMap<String, UserRecord>>,
}

#[derive(Debug, Default, Clone)]
struct UserRecord {
    state: FeedbackState,
    total: usize,
    confirms: usize,
    relevance_sum: u32,
    relevance_count: usize,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event for a user. Returns the per-event adjustment and the
    /// updated state.
    pub fn apply(&self, user_id: &str, event: &FeedbackEvent) -> (f32, FeedbackState) {
        let adjustment = adjustment_for(event);
        let mut map = self.inner.lock().expect("feedback store mutex poisoned");
        let rec = map.entry(user_id.to_string()).or_default();
        rec.state.net_adjustment = round4(rec.state.net_adjustment + adjustment);
        rec.total += 1;
        if event.kind == FeedbackKind::Confirm {
            rec.confirms += 1;
        }
        if let Some(r) = event.relevance {
            rec.relevance_sum += u32::from(r);
            rec.relevance_count += 1;
        }
        (adjustment, rec.state)
    }

    /// Current state for a user (default zero when unknown).
    pub fn state_for(&self, user_id: &str) -> FeedbackState {
        let map = self.inner.lock().expect("feedback store mutex poisoned");
        map.get(user_id).map(|r| r.state).unwrap_or_default()
    }

    /// Aggregate stats used for calibration diagnostics.
    pub fn stats_for(&self, user_id: &str) -> FeedbackStats {
        let map = self.inner.lock().expect("feedback store mutex poisoned");
        match map.get(user_id) {
            Some(r) => FeedbackStats {
                total: r.total,
                confirm_rate: if r.total > 0 {
                    r.confirms as f32 / r.total as f32
                } else {
                    0.0
                },
                avg_relevance: if r.relevance_count > 0 {
                    r.relevance_sum as f32 / r.relevance_count as f32
                } else {
                    0.0
                },
                net_adjustment: r.state.net_adjustment,
            },
            None => FeedbackStats::default(),
        }
    }
}

fn round4(x: f32) -> f32 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: FeedbackKind, relevance: Option<u8>, target: Option<RiskLevel>) -> FeedbackEvent {
        FeedbackEvent {
            kind,
            relevance,
            target_level: target,
            prior_assessment_level: RiskLevel::Weak,
        }
    }

    #[test]
    fn confirm_with_full_relevance_is_the_base_boost() {
        let e = event(FeedbackKind::Confirm, Some(5), None);
        assert!((adjustment_for(&e) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn confirm_without_relevance_defaults_to_base() {
        let e = event(FeedbackKind::Confirm, None, None);
        assert!((adjustment_for(&e) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn confirm_scales_with_relevance() {
        let e = event(FeedbackKind::Confirm, Some(2), None);
        assert!((adjustment_for(&e) - 0.02).abs() < 1e-6);
    }

    #[test]
    fn reject_without_relevance_is_full_penalty() {
        let e = event(FeedbackKind::Reject, None, None);
        assert!((adjustment_for(&e) + 0.10).abs() < 1e-6);
    }

    #[test]
    fn highly_relevant_reject_barely_penalizes() {
        let e = event(FeedbackKind::Reject, Some(5), None);
        assert!(adjustment_for(&e).abs() < 1e-6);
        let e = event(FeedbackKind::Reject, Some(1), None);
        assert!((adjustment_for(&e) + 0.08).abs() < 1e-6);
    }

    #[test]
    fn adjust_is_proportional_to_level_difference() {
        let up = FeedbackEvent {
            kind: FeedbackKind::Adjust,
            relevance: None,
            target_level: Some(RiskLevel::High),
            prior_assessment_level: RiskLevel::Weak,
        };
        assert!((adjustment_for(&up) - 0.06).abs() < 1e-6);

        let down = FeedbackEvent {
            kind: FeedbackKind::Adjust,
            relevance: None,
            target_level: Some(RiskLevel::Low),
            prior_assessment_level: RiskLevel::Moderate,
        };
        assert!((adjustment_for(&down) + 0.06).abs() < 1e-6);
    }

    #[test]
    fn adjust_without_target_is_zero() {
        let e = event(FeedbackKind::Adjust, Some(3), None);
        assert_eq!(adjustment_for(&e), 0.0);
    }

    #[test]
    fn store_accumulates_per_user() {
        let store = FeedbackStore::new();
        let e = event(FeedbackKind::Confirm, Some(5), None);
        for _ in 0..3 {
            store.apply("user-a", &e);
        }
        let s = store.state_for("user-a");
        assert!((s.net_adjustment - 0.15).abs() < 1e-6);
        // Other users are untouched.
        assert_eq!(store.state_for("user-b").net_adjustment, 0.0);
    }

    #[test]
    fn running_sum_is_not_clipped_in_the_store() {
        let store = FeedbackStore::new();
        let e = event(FeedbackKind::Reject, None, None);
        for _ in 0..15 {
            store.apply("gloomy", &e);
        }
        let s = store.state_for("gloomy");
        assert!((s.net_adjustment + 1.5).abs() < 1e-4);
    }

    #[test]
    fn stats_track_totals_and_rates() {
        let store = FeedbackStore::new();
        store.apply("u", &event(FeedbackKind::Confirm, Some(4), None));
        store.apply("u", &event(FeedbackKind::Reject, Some(2), None));
        let stats = store.stats_for("u");
        assert_eq!(stats.total, 2);
        assert!((stats.confirm_rate - 0.5).abs() < 1e-6);
        assert!((stats.avg_relevance - 3.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_user_has_default_stats() {
        let store = FeedbackStore::new();
        assert_eq!(store.stats_for("nobody"), FeedbackStats::default());
    }
}
