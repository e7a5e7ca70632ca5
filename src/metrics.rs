use axum::{routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::recommender::Weights;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn record_recommendation(confidence: Option<f64>) {
    match confidence {
        Some(c) => {
            counter!("coach_recommendations_total").increment(1);
            histogram!("coach_recommendation_confidence").record(c);
        }
        None => counter!("coach_recommendation_empty_total").increment(1),
    }
}

pub fn record_attempt() {
    counter!("coach_attempts_recorded_total").increment(1);
}

pub fn record_code_issue(rule: &'static str) {
    counter!("coach_code_issues_total", "rule" => rule).increment(1);
}

/// Current weights as gauges, refreshed on load and reload.
pub fn record_weights(w: &Weights, reloaded: bool) {
    gauge!("coach_weight", "feature" => "progress_inverse").set(w.progress_inverse);
    gauge!("coach_weight", "feature" => "recency_gap_days").set(w.recency_gap_days);
    gauge!("coach_weight", "feature" => "tag_gap").set(w.tag_gap);
    gauge!("coach_weight", "feature" => "hint_rate").set(w.hint_rate);
    gauge!("coach_weight", "feature" => "bias").set(w.bias);
    if reloaded {
        counter!("coach_weights_reloads_total").increment(1);
    }
}
