//! assessment.rs — Core data model for risk assessments and explainability.
//!
//! Standardized output for LOW/WEAK/MODERATE/HIGH + confidence + ranked
//! signals, so the fusion engine, explanation generator and API all speak
//! the same shapes.

use serde::{Deserialize, Serialize};

/// Discrete overall risk level, ordered from least to most concerning.
///
/// Bucket boundaries over the adjusted score are fixed:
/// `[0,0.25) → LOW, [0.25,0.5) → WEAK, [0.5,0.75) → MODERATE, [0.75,1.0] → HIGH`.
/// The top bucket is inclusive at exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Weak,
    Moderate,
    High,
}

impl RiskLevel {
    /// Ordinal index LOW=0 .. HIGH=3, used by the feedback calibrator.
    pub fn index(self) -> i32 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Weak => 1,
            RiskLevel::Moderate => 2,
            RiskLevel::High => 3,
        }
    }

    /// Map an adjusted score in `[0,1]` to a risk level.
    ///
    /// Input is clamped first, so malformed scores degrade to the nearest
    /// bucket instead of producing an out-of-range level.
    pub fn from_score(score: f32) -> Self {
        let s = clamp01(score);
        if s >= 1.0 {
            // Guard: the half-open intervals below would exclude exactly 1.0.
            return RiskLevel::High;
        }
        if s < 0.25 {
            RiskLevel::Low
        } else if s < 0.5 {
            RiskLevel::Weak
        } else if s < 0.75 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Weak => "WEAK",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// Which extractor produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Text,
    Metric,
}

/// A single detected indicator with an associated severity weight.
///
/// Immutable once created; extractors emit many of these per assessment and
/// the fusion engine ranks them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomSignal {
    /// Human-readable description (e.g. "High-concern symptom mentioned: 'chest pain'").
    pub description: String,
    /// Severity weight in `[0.0, 1.0]`.
    pub weight: f32,
    pub category: SignalCategory,
}

impl SymptomSignal {
    pub fn new(description: impl Into<String>, weight: f32, category: SignalCategory) -> Self {
        Self {
            description: description.into(),
            weight: clamp01(weight),
            category,
        }
    }

    /// Zero-weight placeholder so downstream consumers always see >= 1 signal.
    pub fn placeholder(description: impl Into<String>, category: SignalCategory) -> Self {
        Self::new(description, 0.0, category)
    }
}

/// Output of one extractor for one assessment.
///
/// `score` is the *maximum* of the contributing non-additive weights (plus
/// any additive deltas the extractor applies), clipped to `[0,1]` — the most
/// severe single indicator dominates, deliberately not an average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub signals: Vec<SymptomSignal>,
    pub score: f32,
}

impl ExtractionResult {
    pub fn new(signals: Vec<SymptomSignal>, score: f32) -> Self {
        Self {
            signals,
            score: clamp01(score),
        }
    }

    /// Empty-input result: a single zero-weight placeholder and score 0.0.
    pub fn empty(description: impl Into<String>, category: SignalCategory) -> Self {
        Self {
            signals: vec![SymptomSignal::placeholder(description, category)],
            score: 0.0,
        }
    }

    /// Count of signals that actually carry weight (placeholders excluded).
    pub fn active_signal_count(&self) -> usize {
        self.signals.iter().filter(|s| s.weight > 0.0).count()
    }
}

/// Per-channel contribution breakdown carried in the fusion output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contributions {
    /// `text_score * text_weight`.
    pub text: f32,
    /// `temporal_score * temporal_weight`.
    pub temporal: f32,
    /// Net feedback adjustment applied (clipped at the point of use).
    pub feedback_adjustment: f32,
}

/// Complete fused assessment for one invocation. Immutable; owned by the
/// caller (persisted externally — the pipeline holds no storage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub risk_level: RiskLevel,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Weighted combination before feedback adjustment.
    pub raw_score: f32,
    /// `clip(raw_score + net_adjustment, 0, 1)` — what the level is read from.
    pub adjusted_score: f32,
    pub contributions: Contributions,
    /// All signals merged and sorted descending by weight, top 10 kept.
    pub top_signals: Vec<SymptomSignal>,
}

/// Clamp to [0.0, 1.0].
pub fn clamp01(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}
