//! Pipeline orchestration: runs the two extractors independently, fuses
//! their results, and reports the inference duration.
//!
//! Each extractor sits behind a small capability trait with interchangeable
//! variants selected by configuration at construction time. Only the
//! rule-based variants ship today; selecting the learned variant logs a
//! warning and degrades to rules.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assessment::{ExtractionResult, FusionResult};
use crate::fusion;
use crate::temporal::{DailyMetrics, TemporalSignalExtractor};
use crate::text_signals::TextSignalExtractor;
use crate::weights::{HotReloadWeights, TrendThresholds};

/// Which scoring model variant an extractor should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Rules,
    Learned,
}

/// Text-channel scoring capability.
pub trait TextSignalModel: Send + Sync {
    fn extract(
        &self,
        symptom_text: Option<&str>,
        emoji_tokens: &[String],
        checkbox_tokens: &[String],
    ) -> ExtractionResult;
}

impl TextSignalModel for TextSignalExtractor {
    fn extract(
        &self,
        symptom_text: Option<&str>,
        emoji_tokens: &[String],
        checkbox_tokens: &[String],
    ) -> ExtractionResult {
        TextSignalExtractor::extract(self, symptom_text, emoji_tokens, checkbox_tokens)
    }
}

/// Metric-channel scoring capability. Trend thresholds arrive per call so a
/// hot-reloaded config is in effect for the very next assessment.
pub trait TemporalSignalModel: Send + Sync {
    fn extract(
        &self,
        current: Option<&DailyMetrics>,
        history: &[DailyMetrics],
        trends: &TrendThresholds,
    ) -> ExtractionResult;
}

impl TemporalSignalModel for TemporalSignalExtractor {
    fn extract(
        &self,
        current: Option<&DailyMetrics>,
        history: &[DailyMetrics],
        trends: &TrendThresholds,
    ) -> ExtractionResult {
        TemporalSignalExtractor::extract(self, current, history, trends)
    }
}

/// One assessment request, as supplied by the upstream collaborators
/// (sanitized text/tokens, validated metrics).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentInput {
    pub symptom_text: Option<String>,
    #[serde(default)]
    pub emoji_tokens: Vec<String>,
    #[serde(default)]
    pub checkbox_tokens: Vec<String>,
    pub metrics: Option<DailyMetrics>,
    /// Prior days, oldest first.
    #[serde(default)]
    pub history: Vec<DailyMetrics>,
}

/// Fused result plus the timing metadata the storage collaborator persists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentOutput {
    pub fusion: FusionResult,
    pub inference_time_ms: f64,
}

/// The multi-signal risk inference pipeline. Pure and synchronous per
/// invocation: identical inputs (including `net_adjustment`) yield identical
/// fusion output; the clock is only consulted for the duration measurement.
pub struct RiskPipeline {
    text_model: Box<dyn TextSignalModel>,
    temporal_model: Box<dyn TemporalSignalModel>,
    weights: Arc<HotReloadWeights>,
}

impl RiskPipeline {
    /// Build with rule-based models and the given weight source.
    pub fn new(weights: Arc<HotReloadWeights>) -> Self {
        Self::with_models(ModelKind::Rules, ModelKind::Rules, weights)
    }

    /// Build with explicitly selected model variants.
    pub fn with_models(
        text_kind: ModelKind,
        temporal_kind: ModelKind,
        weights: Arc<HotReloadWeights>,
    ) -> Self {
        Self {
            text_model: build_text_model(text_kind),
            temporal_model: build_temporal_model(temporal_kind),
            weights,
        }
    }

    /// Run the full pipeline for one request.
    ///
    /// The two extractors have no data dependency and feed the fusion
    /// engine; `net_adjustment` is the caller-supplied feedback state
    /// (default 0.0 for users with no feedback history).
    pub fn assess(&self, input: &AssessmentInput, net_adjustment: f32) -> AssessmentOutput {
        let started = Instant::now();
        let weights = self.weights.current();

        let text = self.text_model.extract(
            input.symptom_text.as_deref(),
            &input.emoji_tokens,
            &input.checkbox_tokens,
        );
        let temporal = self.temporal_model.extract(
            input.metrics.as_ref(),
            &input.history,
            &weights.trend_thresholds(),
        );

        let fused = fusion::fuse(&text, &temporal, net_adjustment, &weights);
        let inference_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            risk_level = %fused.risk_level,
            confidence = fused.confidence,
            time_ms = format!("{inference_time_ms:.1}"),
            "risk assessment completed"
        );

        AssessmentOutput {
            fusion: fused,
            inference_time_ms,
        }
    }
}

fn build_text_model(kind: ModelKind) -> Box<dyn TextSignalModel> {
    match kind {
        ModelKind::Rules => Box::new(TextSignalExtractor::new()),
        ModelKind::Learned => {
            warn!("learned text model not available in this build; falling back to rules");
            Box::new(TextSignalExtractor::new())
        }
    }
}

fn build_temporal_model(kind: ModelKind) -> Box<dyn TemporalSignalModel> {
    match kind {
        ModelKind::Rules => Box::new(TemporalSignalExtractor::new()),
        ModelKind::Learned => {
            warn!("learned temporal model not available in this build; falling back to rules");
            Box::new(TemporalSignalExtractor::new())
        }
    }
}
