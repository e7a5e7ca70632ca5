// src/recommender/ranker.rs
//! Ranking: score every candidate independently, then order them.
//!
//! - Score descending (via `f64::total_cmp`; only finite scores reach the sort).
//! - Ties: lower `order_index` first, then lower `lesson_id`.
//!
//! Confidence is a monotone function of score, so this order never contradicts an
//! order by confidence.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::warn;

use super::{score_signals, to_confidence, CandidateSignals, FeatureVector, Weights};

#[derive(Clone, Debug)]
pub struct Candidate {
    pub lesson_id: u64,
    pub order_index: u32,
    pub signals: CandidateSignals,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub lesson_id: u64,
    pub order_index: u32,
    pub score: f64,
    pub confidence: f64,
    pub features: FeatureVector,
}

/// Score, calibrate and sort. Candidates with a non-finite score are dropped.
pub fn rank_candidates(candidates: &[Candidate], weights: &Weights) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .filter_map(|c| {
            let (score, features) = score_signals(weights, &c.signals);
            if !score.is_finite() {
                warn!(
                    target: "recommender",
                    lesson_id = c.lesson_id,
                    %score,
                    "dropping candidate with non-finite score"
                );
                return None;
            }
            Some(RankedCandidate {
                lesson_id: c.lesson_id,
                order_index: c.order_index,
                score,
                confidence: to_confidence(score),
                features,
            })
        })
        .collect();

    ranked.sort_by(compare);
    ranked
}

/// Best candidate, if any.
pub fn select_best(candidates: &[Candidate], weights: &Weights) -> Option<RankedCandidate> {
    rank_candidates(candidates, weights).into_iter().next()
}

fn compare(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.order_index.cmp(&b.order_index))
        .then_with(|| a.lesson_id.cmp(&b.lesson_id))
}
