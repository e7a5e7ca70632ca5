// src/recommender/mod.rs
//! Next-lesson recommender: feature scoring, confidence calibration, ranking.
//!
//! Everything here is pure. Weights are passed in explicitly; the data layer
//! (`crate::signals`) supplies the per-candidate signals.

pub mod calibration;
pub mod ranker;
pub mod scoring;
pub mod weights;

pub use calibration::{to_confidence, try_to_confidence, ScoreError};
pub use ranker::{rank_candidates, select_best, Candidate, RankedCandidate};
pub use scoring::{
    score_candidate, score_candidate_with, score_signals, CandidateSignals, FeatureVector,
};
pub use weights::{
    load_weights_file, load_weights_or_default, parse_weights, Weights, WeightsError,
    DEFAULT_WEIGHTS_PATH,
};
