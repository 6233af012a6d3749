//! Thin HTTP glue over the pipeline. Request validation, consent and
//! persistence live in the surrounding service; these handlers only wire
//! sanitized inputs through the inference path and back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::explain::Explanation;
use crate::feedback::{FeedbackEvent, FeedbackStats, FeedbackStore};
use crate::history::History;
use crate::narrative::{self, DynNarrativeBackend, NarrativePayload};
use crate::pipeline::{AssessmentInput, RiskPipeline};
use crate::weights::HotReloadWeights;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<RiskPipeline>,
    feedback: Arc<FeedbackStore>,
    history: Arc<History>,
    narrative: DynNarrativeBackend,
    narrative_timeout: Duration,
    weights: Arc<HotReloadWeights>,
}

impl AppState {
    pub fn new(narrative: DynNarrativeBackend, narrative_timeout: Duration) -> Self {
        let weights = Arc::new(HotReloadWeights::new(None));
        Self {
            pipeline: Arc::new(RiskPipeline::new(weights.clone())),
            feedback: Arc::new(FeedbackStore::new()),
            history: Arc::new(History::with_capacity(2000)),
            narrative,
            narrative_timeout,
            weights,
        }
    }

    /// Default state: narrative backend from `config/narrative.json`.
    pub fn from_config() -> Self {
        let cfg = narrative::load_narrative_config();
        let timeout = Duration::from_millis(cfg.timeout_ms.unwrap_or(2500));
        Self::new(narrative::build_backend_from_config(&cfg), timeout)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/assess", post(assess))
        .route("/feedback", post(submit_feedback))
        .route("/debug/history", get(debug_history))
        .route("/debug/last-assessment", get(debug_last_assessment))
        .route("/debug/feedback-stats", get(debug_feedback_stats))
        .route("/debug/weights", get(debug_weights))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AssessReq {
    user_id: String,
    #[serde(flatten)]
    input: AssessmentInput,
}

#[derive(serde::Serialize)]
struct AssessResp {
    #[serde(flatten)]
    fusion: crate::assessment::FusionResult,
    explanation: Explanation,
    inference_time_ms: f64,
}

async fn assess(State(state): State<AppState>, Json(body): Json<AssessReq>) -> Json<AssessResp> {
    // Never log raw symptom text; a short hash is enough to correlate runs.
    let text_id = body.input.symptom_text.as_deref().map(anon_hash);
    info!(user = %body.user_id, text_id = ?text_id, "assessment requested");

    let net_adjustment = state.feedback.state_for(&body.user_id).net_adjustment;
    let out = state.pipeline.assess(&body.input, net_adjustment);
    state.history.push(&out.fusion);
    counter!("assessments_total", "level" => out.fusion.risk_level.to_string()).increment(1);

    let payload = NarrativePayload {
        symptom_text: body.input.symptom_text.as_deref(),
        metrics: body.input.metrics.as_ref(),
        history: &body.input.history,
        fusion: &out.fusion,
    };
    let (explanation, degraded) =
        narrative::explain_with_fallback(&state.narrative, &payload, state.narrative_timeout).await;
    if degraded {
        counter!("narrative_fallback_total").increment(1);
    }

    Json(AssessResp {
        fusion: out.fusion,
        explanation,
        inference_time_ms: out.inference_time_ms,
    })
}

#[derive(serde::Deserialize)]
struct FeedbackReq {
    user_id: String,
    #[serde(flatten)]
    event: FeedbackEvent,
}

#[derive(serde::Serialize)]
struct FeedbackResp {
    adjustment: f32,
    net_adjustment: f32,
}

async fn submit_feedback(
    State(state): State<AppState>,
    Json(body): Json<FeedbackReq>,
) -> Json<FeedbackResp> {
    let (adjustment, new_state) = state.feedback.apply(&body.user_id, &body.event);
    counter!("feedback_events_total", "kind" => format!("{:?}", body.event.kind).to_lowercase())
        .increment(1);
    info!(
        user = %body.user_id,
        adjustment,
        net = new_state.net_adjustment,
        "feedback processed"
    );
    Json(FeedbackResp {
        adjustment,
        net_adjustment: new_state.net_adjustment,
    })
}

#[derive(serde::Serialize)]
struct HistoryOut {
    ts_unix: u64,
    risk_level: String,
    confidence: f32,
    adjusted_score: f32,
    top_weights: Vec<f32>,
}

async fn debug_history(State(state): State<AppState>) -> Json<Vec<HistoryOut>> {
    let rows = state.history.snapshot_last_n(10);
    let out = rows
        .into_iter()
        .map(|h| HistoryOut {
            ts_unix: h.ts_unix,
            risk_level: h.risk_level.to_string(),
            confidence: h.confidence,
            adjusted_score: h.adjusted_score,
            top_weights: h.top_weights,
        })
        .collect::<Vec<_>>();
    Json(out)
}

async fn debug_last_assessment(State(state): State<AppState>) -> Json<Option<HistoryOut>> {
    let mut rows = state.history.snapshot_last_n(1);
    Json(rows.pop().map(|h| HistoryOut {
        ts_unix: h.ts_unix,
        risk_level: h.risk_level.to_string(),
        confidence: h.confidence,
        adjusted_score: h.adjusted_score,
        top_weights: h.top_weights,
    }))
}

async fn debug_feedback_stats(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<FeedbackStats> {
    let user = q.get("user_id").cloned().unwrap_or_default();
    Json(state.feedback.stats_for(&user))
}

#[derive(serde::Serialize)]
struct WeightsOut {
    text_weight: f32,
    temporal_weight: f32,
    agreement_weight: f32,
    richness_weight: f32,
    score_weight: f32,
    mood_decline_ratio: f32,
    sleep_decline_ratio: f32,
}

async fn debug_weights(State(state): State<AppState>) -> Json<WeightsOut> {
    let w = state.weights.current();
    Json(WeightsOut {
        text_weight: w.text_weight,
        temporal_weight: w.temporal_weight,
        agreement_weight: w.agreement_weight,
        richness_weight: w.richness_weight,
        score_weight: w.score_weight,
        mood_decline_ratio: w.mood_decline_ratio,
        sleep_decline_ratio: w.sleep_decline_ratio,
    })
}

/// Short anonymized id for correlating log lines without storing raw text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("chest pain");
        let b = anon_hash("chest pain");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_ne!(a, anon_hash("headache"));
    }
}
