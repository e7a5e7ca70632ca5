//! Score → confidence calibration (logistic).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("score is not a number")]
    NotANumber,
}

/// Logistic squashing into `[0, 1]`.
///
/// Non-finite input never propagates: `+inf` → 1.0, `-inf` → 0.0, `NaN` → 0.0.
/// Very large magnitudes saturate to exactly 0.0 or 1.0.
pub fn to_confidence(score: f64) -> f64 {
    try_to_confidence(score).unwrap_or(0.0)
}

/// Like [`to_confidence`] but rejects `NaN` instead of mapping it to 0.0.
pub fn try_to_confidence(score: f64) -> Result<f64, ScoreError> {
    if score.is_nan() {
        return Err(ScoreError::NotANumber);
    }
    if score == f64::INFINITY {
        return Ok(1.0);
    }
    if score == f64::NEG_INFINITY {
        return Ok(0.0);
    }
    Ok(sigmoid(score))
}

// Split form avoids overflow of exp() for large |x|.
fn sigmoid(x: f64) -> f64 {
    let y = if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    };
    y.clamp(0.0, 1.0)
}
