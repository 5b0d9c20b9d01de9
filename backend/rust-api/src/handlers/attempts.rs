use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use super::error::ApiError;
use crate::{
    extractors::ValidatedJson,
    models::attempt::{
        CreateLessonAttemptRequest, CreateQuestionAttemptRequest, LessonAttempt, QuestionAttempt,
    },
    services::{attempt_service::AttemptService, AppState},
};

pub async fn create_lesson_attempt(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateLessonAttemptRequest>,
) -> Result<(StatusCode, Json<LessonAttempt>), ApiError> {
    let service = AttemptService::new(state.store.clone());
    let attempt = service.record_lesson_attempt(&payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

pub async fn create_question_attempt(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateQuestionAttemptRequest>,
) -> Result<(StatusCode, Json<QuestionAttempt>), ApiError> {
    let service = AttemptService::new(state.store.clone());
    let attempt = service.record_question_attempt(&payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}
