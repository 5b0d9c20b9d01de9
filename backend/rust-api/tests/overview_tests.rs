mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_overview_reports_progress_and_next_lesson() {
    let app = common::create_test_app().await;

    let (status, body) = common::get_json(&app, "/api/v1/students/1/overview").await;

    assert_eq!(status, StatusCode::OK);
    let course = &body[0];
    assert_eq!(course["course_name"], json!("Python 101"));
    assert_eq!(course["progress"], json!(0.5));
    assert_eq!(course["next_up"], json!("Loops"));
    assert_eq!(course["last_activity"], json!("2024-04-30T12:00:00Z"));
}

#[tokio::test]
async fn test_overview_for_unknown_student() {
    let app = common::create_test_app().await;

    let (status, _) = common::get_json(&app, "/api/v1/students/3/overview").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_check() {
    let app = common::create_test_app().await;

    let (status, body) = common::get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["dependencies"]["mongodb"]["status"], json!("healthy"));
    assert_eq!(body["database"], json!("learnpath"));
}

#[tokio::test]
async fn test_metrics_require_basic_auth() {
    let app = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expected =
        std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header(
                    header::AUTHORIZATION,
                    format!("Basic {}", general_purpose::STANDARD.encode(expected)),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trace_id_is_echoed() {
    let app = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/courses")
                .header("x-trace-id", "trace-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-trace-id"], "trace-123");
}
