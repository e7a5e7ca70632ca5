//! Course Coach: Binary Entrypoint
//! Boots the Axum HTTP server: config from env, seeded store, scoring weights, routes.

use course_coach::{build_app, telemetry, AppConfig};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    telemetry::enable_dev_tracing();

    let config = AppConfig::from_env()?;
    let router = build_app(config)?;

    Ok(router.into())
}
