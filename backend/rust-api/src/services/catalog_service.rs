use std::sync::Arc;

use crate::models::catalog::{Course, LessonRecord, QuestionView};
use crate::services::learning_store::{LearningStore, StoreError};

pub struct CatalogService {
    store: Arc<dyn LearningStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        self.store.list_courses().await
    }

    pub async fn list_lessons(&self) -> Result<Vec<LessonRecord>, StoreError> {
        self.store.list_lessons().await
    }

    /// `None` when the lesson does not exist, as opposed to an empty question list.
    pub async fn lesson_questions(
        &self,
        lesson_id: i64,
    ) -> Result<Option<Vec<QuestionView>>, StoreError> {
        if self.store.find_lesson(lesson_id).await?.is_none() {
            return Ok(None);
        }
        let questions = self.store.list_questions(Some(lesson_id)).await?;
        Ok(Some(questions.into_iter().map(QuestionView::from).collect()))
    }

    pub async fn list_questions(&self) -> Result<Vec<QuestionView>, StoreError> {
        let questions = self.store.list_questions(None).await?;
        Ok(questions.into_iter().map(QuestionView::from).collect())
    }

    pub async fn get_question(
        &self,
        question_id: i64,
    ) -> Result<Option<QuestionView>, StoreError> {
        Ok(self
            .store
            .find_question(question_id)
            .await?
            .map(QuestionView::from))
    }
}
