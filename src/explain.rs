//! # Explanation Generator
//! Turns a `FusionResult` into a structured, non-clinical explanation:
//! summary, confidence note, per-signal findings, next steps, disclaimer.
//!
//! This is the required rule-based generator. A richer narrative backend
//! (see `narrative`) may replace it at runtime, but must produce the exact
//! same output shape and falls back to this one whenever unavailable.

use serde::{Deserialize, Serialize};

use crate::assessment::{FusionResult, RiskLevel, SignalCategory, SymptomSignal};

/// Max per-signal explanations included.
const MAX_SIGNAL_EXPLANATIONS: usize = 8;
/// Signals below this weight are not worth explaining.
const EXPLAIN_WEIGHT_FLOOR: f32 = 0.3;

pub const DISCLAIMER: &str = "This is a wellness monitoring tool and does not provide medical \
diagnosis, advice, or treatment. Always consult a qualified healthcare professional for medical \
concerns.";

/// Importance bucket for a single explained signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    High,
    Moderate,
    Low,
}

impl Importance {
    /// `weight >= 0.7 → high`, `>= 0.5 → moderate`, else `low`.
    fn from_weight(weight: f32) -> Self {
        if weight >= 0.7 {
            Importance::High
        } else if weight >= 0.5 {
            Importance::Moderate
        } else {
            Importance::Low
        }
    }
}

/// One explained signal, in user-facing language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalExplanation {
    /// Where the finding came from ("Your symptom description" / "Your daily metrics").
    pub source: String,
    pub finding: String,
    pub importance: Importance,
}

/// Structured explanation returned to the caller. The narrative backend must
/// produce this exact shape as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub confidence_note: String,
    pub signal_explanations: Vec<SignalExplanation>,
    pub next_steps: Vec<String>,
    pub disclaimer: String,
}

/// Generate the rule-based explanation for a fused assessment.
pub fn generate(fusion: &FusionResult) -> Explanation {
    Explanation {
        summary: summary_for(fusion.risk_level).to_string(),
        confidence_note: confidence_note(fusion.confidence).to_string(),
        signal_explanations: explain_signals(&fusion.top_signals),
        next_steps: next_steps_for(fusion.risk_level)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        disclaimer: DISCLAIMER.to_string(),
    }
}

fn summary_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Your recent health inputs look stable and within normal patterns.",
        RiskLevel::Weak => {
            "We noticed a few subtle signals that are worth keeping an eye on, but nothing that \
             requires immediate attention."
        }
        RiskLevel::Moderate => {
            "We've detected some noteworthy patterns in your recent health data that suggest you \
             should be more mindful of your wellbeing."
        }
        RiskLevel::High => {
            "Several patterns in your recent health data are raising concern. We recommend taking \
             action and consulting with a healthcare professional."
        }
    }
}

fn confidence_note(confidence: f32) -> &'static str {
    if confidence >= 0.8 {
        "We have high confidence in this assessment based on consistent signals across your inputs."
    } else if confidence >= 0.6 {
        "We have moderate confidence in this assessment. More data points will improve accuracy."
    } else if confidence >= 0.4 {
        "Our confidence is limited. Continue logging daily to help us build a clearer picture."
    } else {
        "This is a preliminary assessment. We need more data to provide more reliable insights."
    }
}

fn next_steps_for(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Low => &[
            "Keep tracking your daily health — consistency improves detection accuracy",
            "Consider setting up regular check-in reminders",
        ],
        RiskLevel::Weak => &[
            "Continue monitoring these patterns over the next few days",
            "Try to identify any recent lifestyle changes that might be contributing",
            "Ensure you're staying hydrated and getting enough rest",
        ],
        RiskLevel::Moderate => &[
            "Consider discussing these patterns with your GP at your next visit",
            "Try to maintain consistent sleep and meal schedules",
            "If symptoms persist for more than a week, seek professional guidance",
            "Use the feedback feature to help us refine our detection for you",
        ],
        RiskLevel::High => &[
            "We strongly recommend speaking with a healthcare professional soon",
            "If you're experiencing acute symptoms, please contact your doctor or local urgent care line",
            "Keep logging daily so we can track any changes",
            "Remember: this is a wellness companion, not a medical diagnostic tool",
        ],
    }
}

/// Explain the ranked signals: weight floor 0.3, stable sort by importance,
/// at most eight entries.
fn explain_signals(signals: &[SymptomSignal]) -> Vec<SignalExplanation> {
    let mut out: Vec<SignalExplanation> = signals
        .iter()
        .filter(|s| s.weight >= EXPLAIN_WEIGHT_FLOOR)
        .map(|s| SignalExplanation {
            source: match s.category {
                SignalCategory::Text => "Your symptom description".to_string(),
                SignalCategory::Metric => "Your daily metrics".to_string(),
            },
            finding: s.description.clone(),
            importance: Importance::from_weight(s.weight),
        })
        .collect();
    // Importance derives Ord with High first; stable sort preserves the
    // incoming weight ranking within a bucket.
    out.sort_by_key(|e| e.importance);
    out.truncate(MAX_SIGNAL_EXPLANATIONS);
    out
}
