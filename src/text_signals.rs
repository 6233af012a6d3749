//! # Text Signal Extractor
//! Scores free text, emoji tokens and checkbox selections for symptom
//! language against a fixed keyword lexicon.
//!
//! Scoring policy: the high/moderate keyword tiers and checkbox matches are
//! max-based (most severe single indicator dominates); persistence phrases
//! and negative-affect emoji are additive on top of that max, to reward
//! repeated mentions of chronicity. Final score is clipped to `[0,1]`.

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::assessment::{clamp01, ExtractionResult, SignalCategory, SymptomSignal};

/// Keyword-tier weights. Fixed, not learned.
const HIGH_CONCERN_WEIGHT: f32 = 0.8;
const MODERATE_CONCERN_WEIGHT: f32 = 0.5;
const PERSISTENCE_WEIGHT: f32 = 0.4;
const PERSISTENCE_DELTA: f32 = 0.15;
const EMOJI_WEIGHT: f32 = 0.3;
const EMOJI_DELTA: f32 = 0.1;
const CHECKBOX_HIGH_WEIGHT: f32 = 0.7;
const CHECKBOX_MODERATE_WEIGHT: f32 = 0.4;

#[derive(Debug, Deserialize)]
struct Lexicon {
    high_concern: Vec<String>,
    moderate_concern: Vec<String>,
    persistence: Vec<String>,
    negative_emoji: Vec<String>,
    checkbox_high: Vec<String>,
    checkbox_moderate: Vec<String>,
}

static LEXICON: Lazy<Lexicon> = Lazy::new(|| {
    let raw = include_str!("../symptom_lexicon.json");
    serde_json::from_str::<Lexicon>(raw).expect("valid symptom lexicon")
});

/// Rule-based text extractor backed by the compile-time lexicon.
#[derive(Debug, Clone, Default)]
pub struct TextSignalExtractor;

impl TextSignalExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text-channel signals. Absent text and empty token lists are
    /// valid inputs; unrecognized tokens are silently dropped.
    pub fn extract(
        &self,
        symptom_text: Option<&str>,
        emoji_tokens: &[String],
        checkbox_tokens: &[String],
    ) -> ExtractionResult {
        let mut signals: Vec<SymptomSignal> = Vec::new();
        // Max over the non-additive tiers.
        let mut base: f32 = 0.0;
        // Sum of additive deltas (persistence + emoji).
        let mut additive: f32 = 0.0;

        if let Some(text) = symptom_text {
            let lower = text.to_lowercase();

            for kw in &LEXICON.high_concern {
                if lower.contains(kw.as_str()) {
                    signals.push(SymptomSignal::new(
                        format!("High-concern symptom mentioned: '{kw}'"),
                        HIGH_CONCERN_WEIGHT,
                        SignalCategory::Text,
                    ));
                    base = base.max(HIGH_CONCERN_WEIGHT);
                }
            }

            for kw in &LEXICON.moderate_concern {
                if lower.contains(kw.as_str()) {
                    signals.push(SymptomSignal::new(
                        format!("Notable symptom mentioned: '{kw}'"),
                        MODERATE_CONCERN_WEIGHT,
                        SignalCategory::Text,
                    ));
                    base = base.max(MODERATE_CONCERN_WEIGHT);
                }
            }

            for phrase in &LEXICON.persistence {
                if lower.contains(phrase.as_str()) {
                    signals.push(SymptomSignal::new(
                        format!("Persistence indicator detected: '{phrase}'"),
                        PERSISTENCE_WEIGHT,
                        SignalCategory::Text,
                    ));
                    additive += PERSISTENCE_DELTA;
                }
            }
        }

        for token in emoji_tokens {
            let lower = token.to_lowercase();
            if LEXICON.negative_emoji.iter().any(|neg| lower.contains(neg.as_str())) {
                signals.push(SymptomSignal::new(
                    format!("Negative health emoji: '{token}'"),
                    EMOJI_WEIGHT,
                    SignalCategory::Text,
                ));
                additive += EMOJI_DELTA;
            }
        }

        for token in checkbox_tokens {
            if LEXICON.checkbox_high.iter().any(|c| c == token) {
                signals.push(SymptomSignal::new(
                    format!("Critical symptom selected: {}", token.replace('_', " ")),
                    CHECKBOX_HIGH_WEIGHT,
                    SignalCategory::Text,
                ));
                base = base.max(CHECKBOX_HIGH_WEIGHT);
            } else if LEXICON.checkbox_moderate.iter().any(|c| c == token) {
                signals.push(SymptomSignal::new(
                    format!("Symptom selected: {}", token.replace('_', " ")),
                    CHECKBOX_MODERATE_WEIGHT,
                    SignalCategory::Text,
                ));
                base = base.max(CHECKBOX_MODERATE_WEIGHT);
            }
            // unmatched checkbox tokens are ignored
        }

        if signals.is_empty() {
            return ExtractionResult::empty(
                "No concerning patterns detected in text inputs",
                SignalCategory::Text,
            );
        }

        ExtractionResult::new(signals, clamp01(base + additive))
    }
}
