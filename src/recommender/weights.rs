//! Scoring coefficients with an optional override from `config/weights.toml`.
//!
//! TOML shape:
//! ```toml
//! [weights]
//! progress_inverse = 2.4
//! recency_gap_days = 1.8
//! tag_gap = 1.2
//! hint_rate = 0.6
//! bias = 3.0
//! ```
//!
//! Every feature coefficient must be finite and strictly positive; that is what
//! keeps the score strictly increasing in each feature. The bias only shifts the
//! score and may take any finite value.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

pub const DEFAULT_WEIGHTS_PATH: &str = "config/weights.toml";

/// Linear scoring coefficients, applied to normalized features.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub progress_inverse: f64,
    pub recency_gap_days: f64,
    pub tag_gap: f64,
    pub hint_rate: f64,
    #[serde(default = "default_bias")]
    pub bias: f64,
}

fn default_bias() -> f64 {
    Weights::default().bias
}

/// Shares 0.4 / 0.3 / 0.2 / 0.1 scaled by 6, centred at 3.0 so a mid-range
/// candidate scores near zero and lands near 0.5 confidence.
impl Default for Weights {
    fn default() -> Self {
        Self {
            progress_inverse: 2.4,
            recency_gap_days: 1.8,
            tag_gap: 1.2,
            hint_rate: 0.6,
            bias: 3.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("reading weights from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("parsing weights TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("weight `{name}` must be finite and > 0, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("bias must be finite, got {0}")]
    NonFiniteBias(f64),
}

impl Weights {
    /// Reject coefficients that would break strict monotonicity.
    pub fn validate(self) -> Result<Self, WeightsError> {
        for (name, value) in [
            ("progress_inverse", self.progress_inverse),
            ("recency_gap_days", self.recency_gap_days),
            ("tag_gap", self.tag_gap),
            ("hint_rate", self.hint_rate),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(WeightsError::NonPositive { name, value });
            }
        }
        if !self.bias.is_finite() {
            return Err(WeightsError::NonFiniteBias(self.bias));
        }
        Ok(self)
    }
}

#[derive(Deserialize)]
struct WeightsFile {
    weights: Weights,
}

/// Parse and validate a weights TOML document.
pub fn parse_weights(s: &str) -> Result<Weights, WeightsError> {
    let file: WeightsFile = toml::from_str(s)?;
    file.weights.validate()
}

/// Load weights directly (no caching). Public for tests/tools.
pub fn load_weights_file(path: &Path) -> Result<Weights, WeightsError> {
    let content = fs::read_to_string(path).map_err(|source| WeightsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_weights(&content)
}

/// Missing file → defaults. A present but invalid file is still an error.
pub fn load_weights_or_default(path: &Path) -> Result<Weights, WeightsError> {
    if !path.exists() {
        return Ok(Weights::default());
    }
    load_weights_file(path)
}
