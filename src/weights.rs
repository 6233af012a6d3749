//! Runtime-calibrated pipeline weights with hot-reload from config/weights.json.
//!
//! JSON shape:
//! {
//!   "text_weight": 0.55,
//!   "temporal_weight": 0.45,
//!   "agreement_weight": 0.5,
//!   "richness_weight": 0.3,
//!   "score_weight": 0.2,
//!   "mood_decline_ratio": 0.30,
//!   "sleep_decline_ratio": 0.25
//! }
//!
//! The numeric values are tunable configuration, not learned parameters.
//! On each `current()` call we check the file's modified time and reload if
//! changed. Missing or invalid files keep the defaults.

use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::RwLock,
    time::SystemTime,
};

/// Fusion + confidence weights; `Default` carries the shipped values.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    /// Share of the text channel in the raw score. Text is slightly favored:
    /// free-text symptom reporting is the richer signal.
    pub text_weight: f32,
    /// Share of the temporal channel in the raw score.
    pub temporal_weight: f32,
    /// Confidence share for cross-channel agreement.
    pub agreement_weight: f32,
    /// Confidence share for data richness (active signal count / 10).
    pub richness_weight: f32,
    /// Confidence share for the adjusted score itself.
    pub score_weight: f32,
    /// Relative mood decline (recent vs overall) that triggers a trend signal.
    /// Mood is deliberately more sensitive than sleep.
    pub mood_decline_ratio: f32,
    /// Relative sleep decline that triggers a trend signal.
    pub sleep_decline_ratio: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            text_weight: 0.55,
            temporal_weight: 0.45,
            agreement_weight: 0.5,
            richness_weight: 0.3,
            score_weight: 0.2,
            mood_decline_ratio: 0.30,
            sleep_decline_ratio: 0.25,
        }
    }
}

impl FusionWeights {
    /// Clamp every field into [0,1]; out-of-range config values degrade to
    /// the nearest bound instead of being rejected.
    pub fn sanitized(mut self) -> Self {
        for v in [
            &mut self.text_weight,
            &mut self.temporal_weight,
            &mut self.agreement_weight,
            &mut self.richness_weight,
            &mut self.score_weight,
            &mut self.mood_decline_ratio,
            &mut self.sleep_decline_ratio,
        ] {
            *v = v.clamp(0.0, 1.0);
        }
        self
    }

    /// Just the trend thresholds, for the temporal extractor.
    pub fn trend_thresholds(&self) -> TrendThresholds {
        TrendThresholds {
            mood_decline_ratio: self.mood_decline_ratio,
            sleep_decline_ratio: self.sleep_decline_ratio,
        }
    }
}

/// Trend sensitivity thresholds consumed by the temporal extractor.
#[derive(Clone, Copy, Debug)]
pub struct TrendThresholds {
    pub mood_decline_ratio: f32,
    pub sleep_decline_ratio: f32,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        FusionWeights::default().trend_thresholds()
    }
}

/// Hot-reload wrapper: reloads when the config file mtime changes.
#[derive(Debug)]
pub struct HotReloadWeights {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    weights: FusionWeights,
    last_modified: Option<SystemTime>,
}

impl HotReloadWeights {
    /// Create with a path (defaults to "config/weights.json" if `None`).
    pub fn new(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("config/weights.json"));
        let weights = load_weights_file(&path).unwrap_or_default();
        let last_modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self {
            path,
            inner: RwLock::new(State {
                weights,
                last_modified,
            }),
        }
    }

    /// Get the latest weights, reloading if the config file changed.
    pub fn current(&self) -> FusionWeights {
        let needs_reload = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => {
                let guard = self.inner.read().expect("weights lock poisoned");
                guard.last_modified != Some(mtime)
            }
            // File absent: keep whatever we have (defaults).
            Err(_) => false,
        };

        if !needs_reload {
            return self.inner.read().expect("weights lock poisoned").weights;
        }

        let mut guard = self.inner.write().expect("weights lock poisoned");
        // Double-check in case of races.
        if let Ok(mtime) = fs::metadata(&self.path).and_then(|m| m.modified()) {
            if guard.last_modified != Some(mtime) {
                if let Ok(w) = load_weights_file(&self.path) {
                    guard.weights = w;
                    guard.last_modified = Some(mtime);
                }
            }
        }
        guard.weights
    }
}

/// Load weights directly (no caching). Public for tests/tools.
pub fn load_weights_file(path: &Path) -> io::Result<FusionWeights> {
    let bytes = fs::read(path)?;
    let w: FusionWeights = serde_json::from_slice(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(w.sanitized())
}
