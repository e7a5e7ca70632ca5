use std::sync::{Arc, RwLock};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::code_checks::{self, Issue, MAX_SNIPPET_BYTES};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::metrics::{self as coach_metrics, Metrics};
use crate::models::{CourseWithLessons, LessonOut, NewAttempt};
use crate::recommendation::{recommend, Recommendation};
use crate::recommender::{load_weights_or_default, Weights};
use crate::signals::{course_overview, CourseProgress};
use crate::store::Store;
use crate::telemetry::anon_hash;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub weights: Arc<RwLock<Weights>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Store, weights: Weights, config: AppConfig) -> Self {
        Self {
            store: Arc::new(store),
            weights: Arc::new(RwLock::new(weights)),
            config: Arc::new(config),
        }
    }

    fn current_weights(&self) -> Result<Weights, ApiError> {
        self.weights
            .read()
            .map(|w| *w)
            .map_err(|_| ApiError::Internal("weights lock poisoned".into()))
    }
}

/// Public routes; debug/admin routes only when the config enables them.
pub fn router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let mut app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/students/{id}/overview/", get(student_overview))
        .route("/api/students/{id}/recommendation/", get(student_recommendation))
        .route("/api/attempts/", post(create_attempt))
        .route("/api/analyze-code/", post(analyze_code))
        .route("/api/courses/", get(course_list))
        .route("/api/courses/{id}/", get(course_detail))
        .route("/api/courses/{id}/lessons/", get(lesson_list));

    if state.config.debug_routes {
        app = app.route("/admin/reload-weights", post(admin_reload_weights));
    }

    let mut app = app.with_state(state);
    if let Some(m) = metrics {
        app = app.merge(m.router());
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}

#[derive(Serialize)]
struct StudentOut {
    id: u64,
    name: String,
}

#[derive(Serialize)]
struct OverviewResp {
    student: StudentOut,
    courses: Vec<CourseProgress>,
}

async fn student_overview(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<OverviewResp>, ApiError> {
    let view = state
        .store
        .student_view(id)?
        .ok_or_else(|| ApiError::NotFound(format!("unknown student {id}")))?;
    let courses = course_overview(&view, &state.config.signals);
    Ok(Json(OverviewResp {
        student: StudentOut {
            id: view.student.id,
            name: view.student.name,
        },
        courses,
    }))
}

async fn student_recommendation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Recommendation>, ApiError> {
    let view = state
        .store
        .student_view(id)?
        .ok_or_else(|| ApiError::NotFound(format!("unknown student {id}")))?;
    let weights = state.current_weights()?;
    let cfg = &state.config;

    let rec = recommend(&view, &weights, &cfg.signals, cfg.alternatives, cfg.now());

    coach_metrics::record_recommendation(rec.recommendation.as_ref().map(|_| rec.confidence));
    info!(
        target: "api",
        student = %anon_hash(&view.student.email),
        lesson_id = rec.recommendation.as_ref().map(|r| r.id),
        confidence = rec.confidence,
        "recommendation served"
    );
    Ok(Json(rec))
}

#[derive(Deserialize)]
struct AttemptReq {
    student: u64,
    lesson: u64,
    #[serde(default)]
    correctness: Option<f64>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    hints_used: u32,
    #[serde(default)]
    duration_sec: u32,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
struct CreatedResp {
    id: u64,
}

async fn create_attempt(
    State(state): State<AppState>,
    Json(body): Json<AttemptReq>,
) -> Result<(StatusCode, Json<CreatedResp>), ApiError> {
    let correctness = match (body.correctness, body.success) {
        (Some(c), _) => c,
        (None, Some(ok)) => {
            if ok {
                1.0
            } else {
                0.0
            }
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either `correctness` or `success` is required".into(),
            ))
        }
    };

    let attempt = state.store.add_attempt(NewAttempt {
        student_id: body.student,
        lesson_id: body.lesson,
        timestamp: state.config.now(),
        correctness,
        hints_used: body.hints_used,
        duration_sec: body.duration_sec,
        code: body.code,
    })?;

    coach_metrics::record_attempt();
    info!(
        target: "api",
        attempt_id = attempt.id,
        lesson_id = attempt.lesson_id,
        correctness = attempt.correctness,
        hints_used = attempt.hints_used,
        "attempt recorded"
    );
    Ok((StatusCode::CREATED, Json(CreatedResp { id: attempt.id })))
}

#[derive(Deserialize)]
struct AnalyzeCodeReq {
    code: String,
}

#[derive(Serialize)]
struct AnalyzeCodeResp {
    issues: Vec<Issue>,
}

async fn analyze_code(Json(body): Json<AnalyzeCodeReq>) -> Result<Json<AnalyzeCodeResp>, ApiError> {
    if body.code.trim().is_empty() {
        return Err(ApiError::BadRequest("`code` must not be empty".into()));
    }
    if body.code.len() > MAX_SNIPPET_BYTES {
        return Err(ApiError::BadRequest(format!(
            "`code` is {} bytes, limit is {MAX_SNIPPET_BYTES}",
            body.code.len()
        )));
    }
    let issues = tokio::task::spawn_blocking(move || code_checks::analyze(&body.code))
        .await
        .map_err(|e| ApiError::Internal(format!("code analysis failed: {e}")))?;
    for i in &issues {
        coach_metrics::record_code_issue(i.rule);
    }
    Ok(Json(AnalyzeCodeResp { issues }))
}

async fn course_list(State(state): State<AppState>) -> Result<Json<Vec<CourseWithLessons>>, ApiError> {
    Ok(Json(state.store.courses()?))
}

async fn course_detail(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CourseWithLessons>, ApiError> {
    state
        .store
        .course(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("unknown course {id}")))
}

async fn lesson_list(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<LessonOut>>, ApiError> {
    let lessons = state
        .store
        .lessons_for(id)?
        .ok_or_else(|| ApiError::NotFound(format!("unknown course {id}")))?;
    Ok(Json(lessons.iter().map(LessonOut::from).collect()))
}

#[derive(Serialize)]
struct ReloadResp {
    reloaded: bool,
    weights: Weights,
}

async fn admin_reload_weights(State(state): State<AppState>) -> Result<Json<ReloadResp>, ApiError> {
    let fresh = match load_weights_or_default(&state.config.weights_path) {
        Ok(w) => w,
        Err(e) => {
            warn!(target: "api", error = %e, "weights reload rejected, keeping previous weights");
            return Err(ApiError::BadRequest(e.to_string()));
        }
    };
    match state.weights.write() {
        Ok(mut w) => *w = fresh,
        Err(_) => return Err(ApiError::Internal("weights lock poisoned".into())),
    }
    coach_metrics::record_weights(&fresh, true);
    info!(target: "api", ?fresh, "weights reloaded");
    Ok(Json(ReloadResp {
        reloaded: true,
        weights: fresh,
    }))
}
