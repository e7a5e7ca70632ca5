//! Feature extraction and the linear urgency score.
//!
//! score = w_p * (progress_inverse / 100)
//!       + w_r * (recency_gap_days / 30)
//!       + w_t * tag_gap
//!       + w_h * hint_rate
//!       - bias
//!
//! Normalizations are linear and unclamped, so with positive weights the score is
//! strictly increasing in each feature. Inputs are not validated: out-of-range
//! values propagate arithmetically.

use serde::{Deserialize, Serialize};

use super::Weights;

/// Days that map a recency gap to 1.0 on the normalized scale.
pub const RECENCY_SCALE_DAYS: f64 = 30.0;

/// The four named features behind a score. Field order is the JSON key order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub progress_inverse: f64,
    pub recency_gap_days: f64,
    pub tag_gap: f64,
    pub hint_rate: f64,
}

impl FeatureVector {
    pub const LEN: usize = 4;

    /// `(name, value)` pairs in a fixed order.
    pub fn entries(&self) -> [(&'static str, f64); Self::LEN] {
        [
            ("progress_inverse", self.progress_inverse),
            ("recency_gap_days", self.recency_gap_days),
            ("tag_gap", self.tag_gap),
            ("hint_rate", self.hint_rate),
        ]
    }
}

/// Raw per-candidate signals as supplied by the data layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSignals {
    /// Percent complete, 0..=100.
    pub progress: f64,
    pub recency_gap_days: f64,
    /// Fraction of topic tags not yet mastered, 0..=1.
    pub tag_gap: f64,
    /// Fraction of attempts that used hints, 0..=1.
    pub hint_rate: f64,
}

/// Score with the built-in default weights.
pub fn score_candidate(
    progress: f64,
    recency_gap_days: f64,
    tag_gap: f64,
    hint_rate: f64,
) -> (f64, FeatureVector) {
    score_candidate_with(
        &Weights::default(),
        progress,
        recency_gap_days,
        tag_gap,
        hint_rate,
    )
}

/// Score with explicit weights.
pub fn score_candidate_with(
    w: &Weights,
    progress: f64,
    recency_gap_days: f64,
    tag_gap: f64,
    hint_rate: f64,
) -> (f64, FeatureVector) {
    let features = FeatureVector {
        progress_inverse: 100.0 - progress,
        recency_gap_days,
        tag_gap,
        hint_rate,
    };

    let score = w.progress_inverse * (features.progress_inverse / 100.0)
        + w.recency_gap_days * (features.recency_gap_days / RECENCY_SCALE_DAYS)
        + w.tag_gap * features.tag_gap
        + w.hint_rate * features.hint_rate
        - w.bias;

    (score, features)
}

/// Convenience over [`score_candidate_with`] for a signals record.
pub fn score_signals(w: &Weights, s: &CandidateSignals) -> (f64, FeatureVector) {
    score_candidate_with(w, s.progress, s.recency_gap_days, s.tag_gap, s.hint_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_pass_through() {
        let (_, f) = score_candidate(30.0, 5.0, 0.4, 0.2);
        assert_eq!(f.progress_inverse, 70.0);
        assert_eq!(f.recency_gap_days, 5.0);
        assert_eq!(f.tag_gap, 0.4);
        assert_eq!(f.hint_rate, 0.2);
    }

    #[test]
    fn default_weights_known_value() {
        // 2.4*0.5 + 1.8*0.1 + 1.2*0.2 + 0.6*0.1 - 3.0 = -1.32
        let (s, _) = score_candidate(50.0, 3.0, 0.2, 0.1);
        assert!((s - (-1.32)).abs() < 1e-12, "got {s}");
    }

    #[test]
    fn lower_progress_scores_higher() {
        let (lo, _) = score_candidate(20.0, 5.0, 0.3, 0.1);
        let (hi, _) = score_candidate(80.0, 5.0, 0.3, 0.1);
        assert!(lo > hi);
    }

    #[test]
    fn each_feature_increases_score() {
        let (base, _) = score_candidate(50.0, 5.0, 0.3, 0.1);
        assert!(score_candidate(50.0, 6.0, 0.3, 0.1).0 > base);
        assert!(score_candidate(50.0, 5.0, 0.4, 0.1).0 > base);
        assert!(score_candidate(50.0, 5.0, 0.3, 0.2).0 > base);
    }

    #[test]
    fn boundaries_are_finite() {
        for (p, r, t, h) in [(0.0, 0.0, 0.0, 0.0), (100.0, 100.0, 1.0, 1.0)] {
            let (s, f) = score_candidate(p, r, t, h);
            assert!(s.is_finite());
            assert_eq!(f.entries().len(), FeatureVector::LEN);
        }
    }

    #[test]
    fn out_of_range_inputs_propagate() {
        // Negative progress is not clamped: progress_inverse exceeds 100.
        let (_, f) = score_candidate(-10.0, 0.0, 1.5, 0.0);
        assert_eq!(f.progress_inverse, 110.0);
        assert_eq!(f.tag_gap, 1.5);
    }

    #[test]
    fn features_serialize_with_fixed_keys() {
        let (_, f) = score_candidate(30.0, 5.0, 0.4, 0.2);
        let v = serde_json::to_value(f).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        for key in ["progress_inverse", "recency_gap_days", "tag_gap", "hint_rate"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }
}
