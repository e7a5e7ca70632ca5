// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// The reference time is pinned so recency (and therefore every score) is
// deterministic against the built-in seed.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use course_coach::code_checks::MAX_SNIPPET_BYTES;
use course_coach::{build_app, AppConfig};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn reference_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-20T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Fresh app (and fresh store) per test.
fn test_router() -> Router {
    let cfg = AppConfig {
        reference_time: Some(reference_time()),
        ..AppConfig::default()
    };
    build_app(cfg).expect("build app")
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    send(app, req).await
}

async fn post(app: &Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST");
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn overview_reports_course_progress() {
    let app = test_router();
    let (status, v) = get(&app, "/api/students/1/overview/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["student"]["name"], "Ananya");

    let courses = v["courses"].as_array().expect("courses array");
    assert_eq!(courses.len(), 3);

    // Lessons 1-3 mastered out of 5.
    assert_eq!(courses[0]["progress"].as_f64().unwrap(), 60.0);
    assert_eq!(courses[0]["next_up"], "Functions and Modules");
    assert_eq!(courses[0]["last_activity"], "2024-01-15T10:30:00Z");

    assert_eq!(courses[1]["progress"].as_f64().unwrap(), 20.0);
    assert_eq!(courses[1]["next_up"], "JavaScript Fundamentals");
}

#[tokio::test]
async fn unknown_student_is_404() {
    let app = test_router();
    for uri in ["/api/students/99/overview/", "/api/students/99/recommendation/"] {
        let (status, v) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(v["error"].is_string());
    }
}

#[tokio::test]
async fn recommendation_contract() {
    let app = test_router();
    let (status, v) = get(&app, "/api/students/1/recommendation/").await;
    assert_eq!(status, StatusCode::OK);

    // Untouched Data Science lessons lead; ties resolve by order_index.
    assert_eq!(v["recommendation"]["id"], 12);
    assert_eq!(v["recommendation"]["title"], "Data Visualization");
    assert_eq!(v["recommendation"]["course_id"], 3);

    let conf = v["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&conf));
    assert!((conf - 0.8316).abs() < 1e-3, "confidence {conf}");

    let features = v["reason_features"].as_object().expect("features object");
    assert_eq!(features.len(), 4);
    assert_eq!(features["progress_inverse"].as_f64().unwrap(), 100.0);
    assert_eq!(features["tag_gap"].as_f64().unwrap(), 1.0);
    assert_eq!(features["hint_rate"].as_f64().unwrap(), 1.0);

    let alt_ids: Vec<u64> = v["alternatives"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_u64().unwrap())
        .collect();
    assert_eq!(alt_ids, vec![13, 14]);

    assert_eq!(v["method"], "heuristic");
    assert!(v["explanation"]
        .as_str()
        .unwrap()
        .starts_with("Next up: \"Data Visualization\""));
}

#[tokio::test]
async fn recommendation_is_stable_across_requests() {
    let app = test_router();
    let (_, first) = get(&app, "/api/students/1/recommendation/").await;
    for _ in 0..4 {
        let (_, again) = get(&app, "/api/students/1/recommendation/").await;
        assert_eq!(first, again);
    }
}

#[tokio::test]
async fn attempt_creation_updates_progress() {
    let app = test_router();
    let (status, v) = post(
        &app,
        "/api/attempts/",
        json!({ "student": 1, "lesson": 4, "correctness": 0.9, "hints_used": 1, "duration_sec": 300 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v["id"], 8);

    let (_, overview) = get(&app, "/api/students/1/overview/").await;
    assert_eq!(overview["courses"][0]["progress"].as_f64().unwrap(), 80.0);
    assert_eq!(overview["courses"][0]["next_up"], "Object-Oriented Programming");
}

#[tokio::test]
async fn attempt_accepts_success_flag() {
    let app = test_router();
    let (status, _) = post(
        &app,
        "/api/attempts/",
        json!({ "student": 2, "lesson": 1, "code": "print('hi')", "hints_used": 0, "success": true }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, overview) = get(&app, "/api/students/2/overview/").await;
    assert_eq!(overview["courses"][0]["progress"].as_f64().unwrap(), 20.0);
}

#[tokio::test]
async fn attempt_validation() {
    let app = test_router();

    let (status, _) = post(
        &app,
        "/api/attempts/",
        json!({ "student": 1, "lesson": 4, "correctness": 1.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/attempts/", json!({ "student": 1, "lesson": 4 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/attempts/",
        json!({ "student": 1, "lesson": 999, "success": false }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &app,
        "/api/attempts/",
        json!({ "student": 42, "lesson": 1, "success": false }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn courses_and_lessons() {
    let app = test_router();

    let (status, v) = get(&app, "/api/courses/").await;
    assert_eq!(status, StatusCode::OK);
    let courses = v.as_array().unwrap();
    assert_eq!(courses.len(), 3);
    for c in courses {
        let orders: Vec<u64> = c["lessons"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["order_index"].as_u64().unwrap())
            .collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }

    let (status, v) = get(&app, "/api/courses/2/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["name"], "Web Development with React");
    assert_eq!(v["difficulty"], 2);

    let (status, v) = get(&app, "/api/courses/3/lessons/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v[0]["title"], "NumPy and Pandas");
    assert_eq!(v[0]["tags"], json!(["numpy", "pandas"]));

    let (status, _) = get(&app, "/api/courses/99/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/api/courses/99/lessons/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analyze_code_returns_issues() {
    let app = test_router();
    let code = "function total(items) {\n  const unused = 1;\n  for (let i = 0; i <= items.length; i++) {\n    console.log(items[i]);\n  }\n}";
    let (status, v) = post(&app, "/api/analyze-code/", json!({ "code": code })).await;
    assert_eq!(status, StatusCode::OK);

    let rules: Vec<&str> = v["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["rule"].as_str().unwrap())
        .collect();
    assert_eq!(rules, vec!["unused-vars", "for-loop-off-by-one", "missing-return"]);
    assert_eq!(v["issues"][0]["severity"], "warn");
    assert_eq!(v["issues"][0]["location"]["line"], 2);

    let (status, _) = post(&app, "/api/analyze-code/", json!({ "code": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_code_sees_template_interpolations() {
    let app = test_router();
    let code = "const name = 'Ada';\nconsole.log(`hi ${name}`);";
    let (status, v) = post(&app, "/api/analyze-code/", json!({ "code": code })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["issues"], json!([]));
}

#[tokio::test]
async fn analyze_code_rejects_oversized_snippets() {
    let app = test_router();
    let body = "total = total + 1; ".repeat(2_000);
    let code = format!("if (a) {{ {body} }}\nif (b) {{ {body}x; }}\nif (c) {{ {body} }}\n{body}{body}");
    assert!(code.len() > MAX_SNIPPET_BYTES);

    let (status, v) = post(&app, "/api/analyze-code/", json!({ "code": code })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().unwrap().contains("limit"));

    // Just under the cap, near-identical large blocks still answer promptly.
    let small = "total = total + 1; ".repeat(1_000);
    let code = format!("if (a) {{ {small} }}\nif (b) {{ {small}x; }}");
    assert!(code.len() <= MAX_SNIPPET_BYTES);
    let started = std::time::Instant::now();
    let (status, _) = post(&app, "/api/analyze-code/", json!({ "code": code })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}

#[tokio::test]
async fn debug_routes_hidden_by_default() {
    let app = test_router();
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let (status, _) = post(&app, "/admin/reload-weights", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
