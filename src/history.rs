//! history.rs — simple in-memory log of recent assessments for diagnostics.
//!
//! Persistence of full `RiskAssessment` records belongs to the storage
//! collaborator; this keeps only a bounded trace for the debug endpoints.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::assessment::{FusionResult, RiskLevel};

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub ts_unix: u64,
    pub risk_level: RiskLevel,
    pub confidence: f32,
    pub adjusted_score: f32,
    // brief explainability fingerprint for quick diagnostics:
    pub top_weights: Vec<f32>,
}

#[derive(Debug)]
pub struct History {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, f: &FusionResult) {
        let entry = HistoryEntry {
            ts_unix: now_unix(),
            risk_level: f.risk_level,
            confidence: f.confidence,
            adjusted_score: f.adjusted_score,
            top_weights: f.top_signals.iter().take(3).map(|s| s.weight).collect(),
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let len = v.len();
        let start = len.saturating_sub(n);
        v[start..].to_vec()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
