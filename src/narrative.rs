//! Narrative backend: provider abstraction for richer, externally generated
//! explanations, with the rule-based generator as the mandatory fallback.
//!
//! The optional provider is tried first under a strict timeout. On timeout,
//! call failure, bad payload, or disabled configuration the rule-based path
//! runs verbatim — callers always receive the same `Explanation` shape and
//! the fallback is never skipped, only logged as a degraded-mode event.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assessment::FusionResult;
use crate::explain::{self, Explanation};
use crate::temporal::DailyMetrics;

/// Signalled when the provider cannot produce an explanation. Carries no
/// payload on purpose: every flavor of failure takes the same fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unavailable;

/// Structured input handed to a provider: recent raw inputs plus the latest
/// fused result.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptom_text: Option<&'a str>,
    pub metrics: Option<&'a DailyMetrics>,
    pub history: &'a [DailyMetrics],
    pub fusion: &'a FusionResult,
}

/// Capability interface for explanation generation. Exactly one required
/// implementation exists (the rule-based generator wrapped by
/// [`explain_with_fallback`]); remote providers are optional extras.
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    async fn generate(&self, payload: &NarrativePayload<'_>) -> Result<Explanation, Unavailable>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

pub type DynNarrativeBackend = Arc<dyn NarrativeBackend>;

/// Config loaded from `config/narrative.json`. Reading/parsing failures fall
/// back to the disabled default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    pub enabled: bool,
    /// "gemini" is the only remote provider for now.
    pub provider: Option<String>,
    /// "ENV" means: read from GEMINI_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Hard deadline for the remote call; defaults to 2500 ms.
    pub timeout_ms: Option<u64>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            api_key: None,
            timeout_ms: Some(2500),
        }
    }
}

/// Load config from `config/narrative.json`, defaulting to disabled.
pub fn load_narrative_config() -> NarrativeConfig {
    let path = Path::new("config/narrative.json");
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => NarrativeConfig::default(),
    }
}

/// Factory: build a backend according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock backend.
/// * Else if `config.enabled == false`, returns the disabled backend.
/// * Else builds the remote provider; a missing API key degrades to disabled.
pub fn build_backend_from_config(config: &NarrativeConfig) -> DynNarrativeBackend {
    if std::env::var("AI_TEST_MODE").map(|v| v == "mock").unwrap_or(false) {
        return Arc::new(MockBackend {
            fixed_summary: "Mock narrative summary.".to_string(),
        });
    }

    if !config.enabled {
        return Arc::new(DisabledBackend);
    }

    match config.provider.as_deref() {
        Some("gemini") => {
            let api_key = match config.api_key.as_deref() {
                Some(k) if !k.trim().eq_ignore_ascii_case("env") => k.to_string(),
                _ => std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            };
            if api_key.is_empty() {
                warn!("narrative provider configured but GEMINI_API_KEY is missing; running rule-based only");
                return Arc::new(DisabledBackend);
            }
            Arc::new(GeminiBackend::new(api_key))
        }
        _ => Arc::new(DisabledBackend),
    }
}

/// Generate an explanation through the backend, with the rule-based
/// generator as the fallback of last resort. Returns the explanation and
/// whether the degraded (fallback) path was taken while a provider was
/// expected to answer.
pub async fn explain_with_fallback(
    backend: &DynNarrativeBackend,
    payload: &NarrativePayload<'_>,
    timeout: Duration,
) -> (Explanation, bool) {
    if backend.provider_name() == "disabled" {
        return (explain::generate(payload.fusion), false);
    }

    match tokio::time::timeout(timeout, backend.generate(payload)).await {
        Ok(Ok(explanation)) => (explanation, false),
        Ok(Err(Unavailable)) => {
            warn!(provider = backend.provider_name(), "narrative backend unavailable; using rule-based explanation");
            (explain::generate(payload.fusion), true)
        }
        Err(_elapsed) => {
            warn!(provider = backend.provider_name(), "narrative backend timed out; using rule-based explanation");
            (explain::generate(payload.fusion), true)
        }
    }
}

/// Always unavailable; used when the narrative feature is off.
pub struct DisabledBackend;

#[async_trait]
impl NarrativeBackend for DisabledBackend {
    async fn generate(&self, _payload: &NarrativePayload<'_>) -> Result<Explanation, Unavailable> {
        Err(Unavailable)
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic mock for tests/local runs: rule-based content with a
/// replaced summary, so tests can tell the paths apart.
pub struct MockBackend {
    pub fixed_summary: String,
}

#[async_trait]
impl NarrativeBackend for MockBackend {
    async fn generate(&self, payload: &NarrativePayload<'_>) -> Result<Explanation, Unavailable> {
        let mut e = explain::generate(payload.fusion);
        e.summary = self.fixed_summary.clone();
        Ok(e)
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Remote provider calling the Gemini REST API. Requires an API key.
pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("health-signal-analyzer/0.1")
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(8))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: "gemini-2.0-flash".to_string(),
        }
    }

    fn prompt(payload: &NarrativePayload<'_>) -> String {
        // The provider must answer with the rule-based output shape; anything
        // else is rejected and the fallback runs.
        format!(
            "You are a wellness companion, not a doctor, and you never diagnose. \
             Given this assessment data, respond ONLY with a JSON object with the keys \
             summary, confidence_note, signal_explanations (array of {{source, finding, \
             importance}} with importance one of low|moderate|high), next_steps (array of \
             strings), disclaimer. Plain, warm, non-clinical language.\n\nDATA:\n{}",
            serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string())
        )
    }
}

#[async_trait]
impl NarrativeBackend for GeminiBackend {
    async fn generate(&self, payload: &NarrativePayload<'_>) -> Result<Explanation, Unavailable> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: RespContent,
        }
        #[derive(Deserialize)]
        struct RespContent {
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            text: String,
        }

        let prompt = Self::prompt(payload);
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|_| Unavailable)?;
        if !resp.status().is_success() {
            return Err(Unavailable);
        }
        let body: Resp = resp.json().await.map_err(|_| Unavailable)?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or(Unavailable)?;

        // Providers sometimes wrap JSON in markdown fences; strip them.
        let trimmed = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        serde_json::from_str::<Explanation>(trimmed).map_err(|_| Unavailable)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
