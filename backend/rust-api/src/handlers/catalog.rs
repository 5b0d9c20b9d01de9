use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::error::ApiError;
use crate::{
    models::catalog::{Course, LessonRecord, QuestionView},
    services::{catalog_service::CatalogService, AppState},
};

pub async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    Ok(Json(service.list_courses().await?))
}

pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LessonRecord>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    Ok(Json(service.list_lessons().await?))
}

pub async fn list_lesson_questions(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<i64>,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    service
        .lesson_questions(lesson_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("lesson {} not found", lesson_id)))
}

pub async fn list_questions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    Ok(Json(service.list_questions().await?))
}

pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<i64>,
) -> Result<Json<QuestionView>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    service
        .get_question(question_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("question {} not found", question_id)))
}
