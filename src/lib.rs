// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod api;
pub mod code_checks;
pub mod config;
pub mod error;
pub mod explain;
pub mod metrics;
pub mod models;
pub mod recommendation;
pub mod recommender;
pub mod signals;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::recommender::{score_candidate, to_confidence, FeatureVector};

use anyhow::Context;
use axum::Router;
use tracing::info;

use crate::metrics::Metrics;
use crate::recommender::load_weights_or_default;
use crate::store::{Seed, Store};

/// Build the full in-process app from environment configuration.
pub async fn app() -> anyhow::Result<Router> {
    build_app(AppConfig::from_env()?)
}

/// Build the full app from an explicit config: seed the store, load weights,
/// and mount `/metrics` when debug routes are on.
pub fn build_app(config: AppConfig) -> anyhow::Result<Router> {
    let seed = Seed::load_or_builtin(&config.seed_path)?;
    let store = Store::from_seed(seed).context("validating seed data")?;

    let weights = load_weights_or_default(&config.weights_path)
        .with_context(|| format!("loading weights from {}", config.weights_path.display()))?;
    info!(target: "recommender", ?weights, "scoring weights loaded");

    let metrics = if config.debug_routes {
        Some(Metrics::init()?)
    } else {
        None
    };
    crate::metrics::record_weights(&weights, false);

    let state = AppState::new(store, weights, config);
    Ok(api::router(state, metrics.as_ref()))
}
