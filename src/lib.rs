// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod assessment;
pub mod explain;
pub mod feedback;
pub mod fusion;
pub mod history;
pub mod metrics;
pub mod narrative;
pub mod pipeline;
pub mod temporal;
pub mod text_signals;
pub mod weights;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::assessment::{
    Contributions, ExtractionResult, FusionResult, RiskLevel, SignalCategory, SymptomSignal,
};
pub use crate::explain::Explanation;
pub use crate::feedback::{FeedbackEvent, FeedbackKind, FeedbackState, FeedbackStore};
pub use crate::pipeline::{AssessmentInput, AssessmentOutput, RiskPipeline};
pub use crate::temporal::DailyMetrics;
