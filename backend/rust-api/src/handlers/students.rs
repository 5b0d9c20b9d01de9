use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::ApiError;
use crate::{
    models::{
        attempt::QuestionAttempt, recommendation::RecommendationResponse,
        student::CourseOverview,
    },
    services::{
        attempt_service::AttemptService, overview_service::OverviewService,
        recommender::RecommendationService, AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Evaluation instant; defaults to the current time.
    pub at: Option<DateTime<Utc>>,
}

pub async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i64>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let Query(query) =
        query.map_err(|err| ApiError::bad_request(format!("Invalid query: {}", err)))?;

    ensure_student(&state, student_id).await?;

    let now = query.at.unwrap_or_else(Utc::now);
    let service = RecommendationService::new(state.store.clone());
    let response = service.recommend(student_id, now).await?;

    Ok(Json(response))
}

pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<CourseOverview>>, ApiError> {
    ensure_student(&state, student_id).await?;

    let service = OverviewService::new(state.store.clone());
    Ok(Json(service.student_overview(student_id).await?))
}

pub async fn list_question_attempts(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<QuestionAttempt>>, ApiError> {
    let service = AttemptService::new(state.store.clone());
    Ok(Json(service.list_question_attempts(student_id).await?))
}

async fn ensure_student(state: &AppState, student_id: i64) -> Result<(), ApiError> {
    if state.store.student_exists(student_id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found(format!("student {} not found", student_id)))
    }
}
