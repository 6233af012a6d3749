//! # Fusion Engine
//! Pure, testable logic that maps `(text result, temporal result, net
//! feedback adjustment)` → `FusionResult`. No I/O, suitable for unit tests
//! and offline evaluation.
//!
//! Policy: fixed-weight combination of the two channel scores (text slightly
//! favored), feedback adjustment applied then clipped, risk level read from
//! the fixed four-bucket table. Confidence rewards agreement between the
//! independent channels over either channel's raw intensity — when the two
//! extractors disagree, trust in the result drops even if one of them
//! screams high risk.

use crate::assessment::{clamp01, Contributions, ExtractionResult, FusionResult, RiskLevel};
use crate::weights::FusionWeights;

/// Number of merged signals kept in `top_signals`.
const TOP_SIGNALS: usize = 10;
/// Active-signal count at which data richness saturates.
const RICHNESS_SATURATION: f32 = 10.0;

/// Fuse the two channel results into a final assessment.
///
/// Never fails: channel scores outside `[0,1]` are clipped rather than
/// rejected.
pub fn fuse(
    text: &ExtractionResult,
    temporal: &ExtractionResult,
    net_adjustment: f32,
    weights: &FusionWeights,
) -> FusionResult {
    let text_score = clamp01(text.score);
    let temporal_score = clamp01(temporal.score);

    let raw_score = weights.text_weight * text_score + weights.temporal_weight * temporal_score;
    let adjusted_score = clamp01(raw_score + net_adjustment);
    let risk_level = RiskLevel::from_score(adjusted_score);

    // Agreement between independent channels; 1.0 when both sub-scores match.
    let signal_agreement = 1.0 - (text_score - temporal_score).abs();
    // Placeholders carry no information, so only weighted signals count.
    let active = (text.active_signal_count() + temporal.active_signal_count()) as f32;
    let data_richness = (active / RICHNESS_SATURATION).min(1.0);

    let confidence = clamp01(
        weights.agreement_weight * signal_agreement
            + weights.richness_weight * data_richness
            + weights.score_weight * adjusted_score,
    );

    // Merge and rank; stable sort keeps text-before-temporal order on ties.
    let mut top_signals = Vec::with_capacity(text.signals.len() + temporal.signals.len());
    top_signals.extend(text.signals.iter().cloned());
    top_signals.extend(temporal.signals.iter().cloned());
    top_signals.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_signals.truncate(TOP_SIGNALS);

    FusionResult {
        risk_level,
        confidence,
        raw_score,
        adjusted_score,
        contributions: Contributions {
            text: weights.text_weight * text_score,
            temporal: weights.temporal_weight * temporal_score,
            feedback_adjustment: adjusted_score - raw_score,
        },
        top_signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{SignalCategory, SymptomSignal};

    fn result(score: f32, weights: &[f32], category: SignalCategory) -> ExtractionResult {
        let signals = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| SymptomSignal::new(format!("signal {i}"), w, category))
            .collect();
        ExtractionResult::new(signals, score)
    }

    fn defaults() -> FusionWeights {
        FusionWeights::default()
    }

    #[test]
    fn text_only_high_concern_lands_in_weak() {
        // Scenario: text_score 0.8, temporal placeholder 0.0.
        let text = result(0.8, &[0.8, 0.8], SignalCategory::Text);
        let temporal = ExtractionResult::empty("Daily metrics within normal range", SignalCategory::Metric);
        let f = fuse(&text, &temporal, 0.0, &defaults());
        assert!((f.raw_score - 0.44).abs() < 1e-6);
        assert_eq!(f.risk_level, RiskLevel::Weak);
    }

    #[test]
    fn temporal_only_lands_in_weak() {
        let text = ExtractionResult::empty("No concerning patterns detected", SignalCategory::Text);
        let temporal = result(0.7, &[0.7, 0.6], SignalCategory::Metric);
        let f = fuse(&text, &temporal, 0.0, &defaults());
        assert!((f.raw_score - 0.315).abs() < 1e-6);
        assert_eq!(f.risk_level, RiskLevel::Weak);
    }

    #[test]
    fn empty_both_is_low_with_agreement_driven_confidence() {
        let text = ExtractionResult::empty("No concerning patterns detected", SignalCategory::Text);
        let temporal = ExtractionResult::empty("Daily metrics within normal range", SignalCategory::Metric);
        let f = fuse(&text, &temporal, 0.0, &defaults());
        assert_eq!(f.risk_level, RiskLevel::Low);
        assert_eq!(f.raw_score, 0.0);
        // agreement 1.0, richness 0 (placeholders don't count), score 0.
        assert!((f.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn adjustment_is_applied_then_clipped() {
        let text = result(0.9, &[0.9], SignalCategory::Text);
        let temporal = result(0.9, &[0.9], SignalCategory::Metric);
        let f = fuse(&text, &temporal, 5.0, &defaults());
        assert_eq!(f.adjusted_score, 1.0);
        assert_eq!(f.risk_level, RiskLevel::High);

        let g = fuse(&text, &temporal, -5.0, &defaults());
        assert_eq!(g.adjusted_score, 0.0);
        assert_eq!(g.risk_level, RiskLevel::Low);
    }

    #[test]
    fn negative_adjustment_never_raises_risk_level() {
        let text = result(0.8, &[0.8], SignalCategory::Text);
        let temporal = result(0.6, &[0.6], SignalCategory::Metric);
        let base = fuse(&text, &temporal, 0.0, &defaults());
        let lowered = fuse(&text, &temporal, -0.2, &defaults());
        assert!(lowered.risk_level <= base.risk_level);
    }

    #[test]
    fn disagreement_lowers_confidence() {
        let agree = fuse(
            &result(0.8, &[0.8], SignalCategory::Text),
            &result(0.8, &[0.8], SignalCategory::Metric),
            0.0,
            &defaults(),
        );
        let disagree = fuse(
            &result(0.8, &[0.8], SignalCategory::Text),
            &result(0.0, &[], SignalCategory::Metric),
            0.0,
            &defaults(),
        );
        assert!(disagree.confidence < agree.confidence);
    }

    #[test]
    fn malformed_channel_scores_are_clipped() {
        let mut text = result(0.5, &[0.5], SignalCategory::Text);
        text.score = 0.9; // legal, but pretend extractor misbehaved upstream:
        let temporal = ExtractionResult {
            signals: vec![SymptomSignal::new("bad", 0.4, SignalCategory::Metric)],
            score: 7.0,
        };
        let f = fuse(&text, &temporal, 0.0, &defaults());
        assert!(f.raw_score <= 1.0);
        assert!(f.confidence >= 0.0 && f.confidence <= 1.0);
    }

    #[test]
    fn signals_are_merged_ranked_and_capped_at_ten() {
        let text = result(0.8, &[0.8, 0.5, 0.4, 0.4, 0.4, 0.4], SignalCategory::Text);
        let temporal = result(0.7, &[0.7, 0.6, 0.5, 0.35, 0.35, 0.35], SignalCategory::Metric);
        let f = fuse(&text, &temporal, 0.0, &defaults());
        assert_eq!(f.top_signals.len(), 10);
        assert!((f.top_signals[0].weight - 0.8).abs() < 1e-6);
        for pair in f.top_signals.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn contributions_break_down_the_raw_score() {
        let text = result(0.6, &[0.6], SignalCategory::Text);
        let temporal = result(0.4, &[0.4], SignalCategory::Metric);
        let f = fuse(&text, &temporal, 0.1, &defaults());
        assert!((f.contributions.text - 0.33).abs() < 1e-6);
        assert!((f.contributions.temporal - 0.18).abs() < 1e-6);
        assert!((f.contributions.feedback_adjustment - 0.1).abs() < 1e-5);
        assert!((f.contributions.text + f.contributions.temporal - f.raw_score).abs() < 1e-6);
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let text = result(0.8, &[0.8, 0.4], SignalCategory::Text);
        let temporal = result(0.35, &[0.35], SignalCategory::Metric);
        let a = fuse(&text, &temporal, 0.05, &defaults());
        let b = fuse(&text, &temporal, 0.05, &defaults());
        assert_eq!(a, b);
    }
}
