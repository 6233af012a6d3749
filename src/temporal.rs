//! # Temporal Signal Extractor
//! Scores the current day's numeric metrics against fixed absolute
//! thresholds, and historical metric sequences for declining trends.
//!
//! Per metric per day, only the single highest-weight threshold that the
//! value satisfies contributes a signal (no double-counting). Unlike the
//! text channel there is no additive component: the channel score is a
//! plain max over signal weights.

use serde::{Deserialize, Serialize};

use crate::assessment::{ExtractionResult, SignalCategory, SymptomSignal};
use crate::weights::TrendThresholds;

/// One day of self-reported metrics. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    /// Hours slept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f32>,
    /// Self-rated mood, 1–10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_score: Option<f32>,
    /// Self-rated energy, 1–10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<f32>,
    /// Self-rated stress, 1–10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<f32>,
    /// Step count for the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_count: Option<u32>,
}

impl DailyMetrics {
    /// True when no metric at all was reported.
    pub fn is_empty(&self) -> bool {
        self.sleep_hours.is_none()
            && self.mood_score.is_none()
            && self.energy_level.is_none()
            && self.stress_level.is_none()
            && self.steps_count.is_none()
    }
}

/// Rule-based temporal extractor (statistical baseline variant). Stateless;
/// trend thresholds are supplied per call so config reloads take effect
/// immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalSignalExtractor;

impl TemporalSignalExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract metric-channel signals from the current day plus an
    /// oldest-first history. Missing metrics are valid; an entirely empty
    /// input yields the placeholder result with score 0.0.
    pub fn extract(
        &self,
        current: Option<&DailyMetrics>,
        history: &[DailyMetrics],
        trends: &TrendThresholds,
    ) -> ExtractionResult {
        let mut signals: Vec<SymptomSignal> = Vec::new();
        let mut score: f32 = 0.0;

        if let Some(m) = current {
            // Sleep: only the most severe matching band counts.
            if let Some(sleep) = m.sleep_hours {
                if sleep < 4.0 {
                    push(&mut signals, &mut score, format!("Critically low sleep: {sleep}h (< 4h)"), 0.7);
                } else if sleep < 6.0 {
                    push(&mut signals, &mut score, format!("Below-average sleep: {sleep}h (< 6h)"), 0.4);
                } else if sleep > 12.0 {
                    push(&mut signals, &mut score, format!("Excessive sleep: {sleep}h (> 12h)"), 0.5);
                }
            }

            if let Some(mood) = m.mood_score {
                if mood <= 2.0 {
                    push(&mut signals, &mut score, format!("Very low mood score: {mood}/10"), 0.6);
                } else if mood <= 4.0 {
                    push(&mut signals, &mut score, format!("Low mood score: {mood}/10"), 0.35);
                }
            }

            if let Some(energy) = m.energy_level {
                if energy <= 3.0 {
                    push(&mut signals, &mut score, format!("Low energy level: {energy}/10"), 0.4);
                }
            }

            if let Some(stress) = m.stress_level {
                if stress >= 8.0 {
                    push(&mut signals, &mut score, format!("High stress level: {stress}/10"), 0.5);
                }
            }
        }

        // Trend analysis over the historical window.
        if history.len() >= 3 {
            let moods: Vec<f32> = history.iter().filter_map(|m| m.mood_score).collect();
            if let Some((recent, overall)) = recent_vs_overall(&moods) {
                if recent < overall * (1.0 - trends.mood_decline_ratio) {
                    push(
                        &mut signals,
                        &mut score,
                        format!(
                            "Declining mood trend detected (recent avg: {recent:.1} vs overall: {overall:.1})"
                        ),
                        0.6,
                    );
                }
            }

            let sleeps: Vec<f32> = history.iter().filter_map(|m| m.sleep_hours).collect();
            if let Some((recent, overall)) = recent_vs_overall(&sleeps) {
                if recent < overall * (1.0 - trends.sleep_decline_ratio) {
                    push(
                        &mut signals,
                        &mut score,
                        format!(
                            "Declining sleep trend detected (recent avg: {recent:.1}h vs overall: {overall:.1}h)"
                        ),
                        0.55,
                    );
                }
            }
        }

        if signals.is_empty() {
            return ExtractionResult::empty("Daily metrics within normal range", SignalCategory::Metric);
        }

        ExtractionResult::new(signals, score)
    }
}

fn push(signals: &mut Vec<SymptomSignal>, score: &mut f32, description: String, weight: f32) {
    signals.push(SymptomSignal::new(description, weight, SignalCategory::Metric));
    *score = score.max(weight);
}

/// Compare the recent sub-window average against the overall average.
///
/// The recent window is the last 3 values, except with exactly three points
/// where only the latest value is compared against the full-series mean (a
/// last-3 window there would equal the overall mean and could never trigger).
fn recent_vs_overall(values: &[f32]) -> Option<(f32, f32)> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let k = if n == 3 { 1 } else { 3 };
    let recent = mean(&values[n - k..]);
    let overall = mean(values);
    Some((recent, overall))
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}
