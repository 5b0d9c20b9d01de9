use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Read-mostly JSON API consumed by browser frontends
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-trace-id")])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1", api_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/students/{id}/recommendation",
            get(handlers::students::get_recommendation),
        )
        .route(
            "/students/{id}/overview",
            get(handlers::students::get_overview),
        )
        .route(
            "/students/{id}/question-attempts",
            get(handlers::students::list_question_attempts),
        )
        .route("/courses", get(handlers::catalog::list_courses))
        .route("/lessons", get(handlers::catalog::list_lessons))
        .route(
            "/lessons/{id}/questions",
            get(handlers::catalog::list_lesson_questions),
        )
        .route("/questions", get(handlers::catalog::list_questions))
        .route("/questions/{id}", get(handlers::catalog::get_question))
        .route("/attempts", post(handlers::attempts::create_lesson_attempt))
        .route(
            "/question-attempts",
            post(handlers::attempts::create_question_attempt),
        )
}
