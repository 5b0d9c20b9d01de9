use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    attempt::{LessonAttempt, NewLessonAttempt, NewQuestionAttempt, QuestionAttempt},
    catalog::{CatalogLesson, Course, LessonRecord, Question, QuestionTotals},
    student::Student,
};

pub mod memory;
pub mod mongo;

pub use memory::InMemoryLearningStore;
pub use mongo::MongoLearningStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read access to courses, lessons and questions.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All lessons joined with their course difficulty, ordered by
    /// (course_id, order_index, id). The order is stable between calls.
    async fn get_all_lessons(&self) -> Result<Vec<CatalogLesson>, StoreError>;

    async fn get_question_totals(&self, lesson_id: i64) -> Result<QuestionTotals, StoreError>;

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError>;

    async fn list_lessons(&self) -> Result<Vec<LessonRecord>, StoreError>;

    async fn find_lesson(&self, lesson_id: i64) -> Result<Option<LessonRecord>, StoreError>;

    /// Questions ordered by (lesson_id, order_index), optionally for one lesson only.
    async fn list_questions(&self, lesson_id: Option<i64>) -> Result<Vec<Question>, StoreError>;

    async fn find_question(&self, question_id: i64) -> Result<Option<Question>, StoreError>;
}

/// Students and their attempt histories.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn find_student(&self, student_id: i64) -> Result<Option<Student>, StoreError>;

    async fn student_exists(&self, student_id: i64) -> Result<bool, StoreError> {
        Ok(self.find_student(student_id).await?.is_some())
    }

    async fn get_lesson_attempts(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Vec<LessonAttempt>, StoreError>;

    async fn get_question_attempts(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Vec<QuestionAttempt>, StoreError>;

    async fn list_student_lesson_attempts(
        &self,
        student_id: i64,
    ) -> Result<Vec<LessonAttempt>, StoreError>;

    /// Newest first.
    async fn list_student_question_attempts(
        &self,
        student_id: i64,
    ) -> Result<Vec<QuestionAttempt>, StoreError>;

    async fn insert_lesson_attempt(
        &self,
        attempt: NewLessonAttempt,
    ) -> Result<LessonAttempt, StoreError>;

    async fn insert_question_attempt(
        &self,
        attempt: NewQuestionAttempt,
    ) -> Result<QuestionAttempt, StoreError>;
}

#[async_trait]
pub trait LearningStore: CatalogStore + AttemptStore {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Sort key shared by every store so tie-breaking in the recommender is identical.
pub(crate) fn catalog_order(lesson: &CatalogLesson) -> (i64, i32, i64) {
    (lesson.course_id, lesson.order_index, lesson.id)
}
