// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /assess (shape + scenario values + feedback coupling)
// - POST /feedback
// - GET /debug/last-assessment

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use health_signal_analyzer::api::{create_router, AppState};
use health_signal_analyzer::narrative::DisabledBackend;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Build the same Router the binary uses, with the narrative backend off.
fn test_router() -> Router {
    let state = AppState::new(Arc::new(DisabledBackend), Duration::from_millis(100));
    create_router(state)
}

async fn post_json(app: Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v: Json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_assess_returns_expected_json_fields() {
    let app = test_router();

    let payload = json!({
        "user_id": "u-1",
        "symptom_text": "I've had chest pain and shortness of breath",
    });
    let (status, body) = post_json(app, "/assess", payload).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["risk_level"], json!("WEAK"));
    let raw = body["raw_score"].as_f64().unwrap();
    assert!((raw - 0.44).abs() < 1e-5, "raw_score ~= 0.44, got {raw}");
    assert!(body["confidence"].as_f64().unwrap() <= 1.0);
    assert!(body["top_signals"].is_array());
    assert!(body["contributions"]["text"].is_number());
    assert!(body["explanation"]["summary"].is_string());
    assert!(body["explanation"]["disclaimer"].is_string());
    assert!(body["inference_time_ms"].is_number());
}

#[tokio::test]
async fn api_assess_accepts_metrics_and_history() {
    let app = test_router();

    let payload = json!({
        "user_id": "u-2",
        "metrics": { "sleep_hours": 3.0, "mood_score": 2.0 },
        "history": [
            { "mood_score": 8.0 },
            { "mood_score": 8.0 },
            { "mood_score": 2.0 }
        ]
    });
    let (status, body) = post_json(app, "/assess", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_level"], json!("WEAK"));
    let findings: Vec<&str> = body["top_signals"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["description"].as_str())
        .collect();
    assert!(findings.iter().any(|f| f.contains("Declining mood trend")));
}

#[tokio::test]
async fn api_feedback_accumulates_and_feeds_assessment() {
    let app = test_router();

    // Three confirms with full relevance on a prior WEAK assessment.
    for _ in 0..3 {
        let (status, body) = post_json(
            app.clone(),
            "/feedback",
            json!({
                "user_id": "u-3",
                "type": "confirm",
                "relevance": 5,
                "prior_assessment_level": "WEAK"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let adj = body["adjustment"].as_f64().unwrap();
        assert!((adj - 0.05).abs() < 1e-6);
    }

    // Net adjustment 0.15 shifts the next run for this user.
    let (_, assessed) = post_json(
        app.clone(),
        "/assess",
        json!({
            "user_id": "u-3",
            "symptom_text": "I've had chest pain"
        }),
    )
    .await;
    let adjusted = assessed["adjusted_score"].as_f64().unwrap();
    assert!((adjusted - 0.59).abs() < 1e-5, "0.44 + 0.15, got {adjusted}");
    assert_eq!(assessed["risk_level"], json!("MODERATE"));

    // Other users are unaffected.
    let (_, other) = post_json(
        app,
        "/assess",
        json!({ "user_id": "someone-else", "symptom_text": "I've had chest pain" }),
    )
    .await;
    assert!((other["adjusted_score"].as_f64().unwrap() - 0.44).abs() < 1e-5);
}

#[tokio::test]
async fn api_feedback_adjust_needs_a_target_level() {
    let app = test_router();
    let (status, body) = post_json(
        app,
        "/feedback",
        json!({
            "user_id": "u-4",
            "type": "adjust",
            "prior_assessment_level": "MODERATE"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adjustment"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn api_debug_last_assessment_reflects_latest_run() {
    let app = test_router();

    let _ = post_json(
        app.clone(),
        "/assess",
        json!({ "user_id": "u-5", "symptom_text": "dizzy and anxious" }),
    )
    .await;

    let req = Request::builder()
        .method("GET")
        .uri("/debug/last-assessment")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert!(v.is_object(), "expected a recorded assessment, got {v}");
    assert!(v["risk_level"].is_string());
    assert!(v["confidence"].is_number());
}
