// src/config.rs
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::recommender::DEFAULT_WEIGHTS_PATH;
use crate::signals::SignalParams;
use crate::store::DEFAULT_SEED_PATH;

// --- env names ---
pub const ENV_SEED_PATH: &str = "COACH_SEED_PATH";
pub const ENV_WEIGHTS_PATH: &str = "COACH_WEIGHTS_PATH";
pub const ENV_MASTERY_THRESHOLD: &str = "COACH_MASTERY_THRESHOLD";
pub const ENV_UNSEEN_RECENCY_DAYS: &str = "COACH_UNSEEN_RECENCY_DAYS";
pub const ENV_ALTERNATIVES: &str = "COACH_ALTERNATIVES";
pub const ENV_REFERENCE_TIME: &str = "COACH_REFERENCE_TIME";
pub const ENV_DEBUG_ROUTES: &str = "DEBUG_ROUTES";

pub const DEFAULT_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub seed_path: PathBuf,
    pub weights_path: PathBuf,
    pub signals: SignalParams,
    /// Runners-up returned next to the recommendation.
    pub alternatives: usize,
    /// Fixed "now" for recency; `None` means the wall clock.
    pub reference_time: Option<DateTime<Utc>>,
    /// Exposes `/metrics` and `/admin/*`.
    pub debug_routes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from(DEFAULT_SEED_PATH),
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            signals: SignalParams::default(),
            alternatives: DEFAULT_ALTERNATIVES,
            reference_time: None,
            debug_routes: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup (env, tests).
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(p) = get(ENV_SEED_PATH) {
            cfg.seed_path = PathBuf::from(p);
        }
        if let Some(p) = get(ENV_WEIGHTS_PATH) {
            cfg.weights_path = PathBuf::from(p);
        }
        if let Some(raw) = get(ENV_MASTERY_THRESHOLD) {
            let v: f64 = raw
                .parse()
                .with_context(|| format!("{ENV_MASTERY_THRESHOLD}={raw} is not a number"))?;
            if !v.is_finite() {
                return Err(anyhow!("{ENV_MASTERY_THRESHOLD} must be finite"));
            }
            cfg.signals.mastery_threshold = v.clamp(0.0, 1.0);
        }
        if let Some(raw) = get(ENV_UNSEEN_RECENCY_DAYS) {
            let v: f64 = raw
                .parse()
                .with_context(|| format!("{ENV_UNSEEN_RECENCY_DAYS}={raw} is not a number"))?;
            if !(v.is_finite() && v >= 0.0) {
                return Err(anyhow!("{ENV_UNSEEN_RECENCY_DAYS} must be >= 0, got {v}"));
            }
            cfg.signals.unseen_recency_days = v;
        }
        if let Some(raw) = get(ENV_ALTERNATIVES) {
            cfg.alternatives = raw
                .parse()
                .with_context(|| format!("{ENV_ALTERNATIVES}={raw} is not a count"))?;
        }
        if let Some(raw) = get(ENV_REFERENCE_TIME) {
            let ts = DateTime::parse_from_rfc3339(&raw)
                .with_context(|| format!("{ENV_REFERENCE_TIME}={raw} is not RFC 3339"))?;
            cfg.reference_time = Some(ts.with_timezone(&Utc));
        }
        cfg.debug_routes = get(ENV_DEBUG_ROUTES).is_some_and(|v| v == "1");

        Ok(cfg)
    }

    /// Reference time for one request.
    pub fn now(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now)
    }
}
