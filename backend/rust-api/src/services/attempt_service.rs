use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::metrics::record_attempt;
use crate::models::attempt::{
    CreateLessonAttemptRequest, CreateQuestionAttemptRequest, LessonAttempt, NewLessonAttempt,
    NewQuestionAttempt, QuestionAttempt,
};
use crate::services::learning_store::{LearningStore, StoreError};

/// Points deducted from a correct answer for every hint revealed.
const HINT_PENALTY_POINTS: i64 = 2;

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("student {0} not found")]
    StudentNotFound(i64),
    #[error("lesson {0} not found")]
    LessonNotFound(i64),
    #[error("question {0} not found")]
    QuestionNotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AttemptService {
    store: Arc<dyn LearningStore>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    pub async fn record_lesson_attempt(
        &self,
        req: &CreateLessonAttemptRequest,
        now: DateTime<Utc>,
    ) -> Result<LessonAttempt, AttemptError> {
        self.ensure_student(req.student_id).await?;
        if self.store.find_lesson(req.lesson_id).await?.is_none() {
            return Err(AttemptError::LessonNotFound(req.lesson_id));
        }

        let attempt = self
            .store
            .insert_lesson_attempt(NewLessonAttempt {
                student_id: req.student_id,
                lesson_id: req.lesson_id,
                timestamp: now,
                correctness: req.correctness,
                hints_used: req.hints_used,
                duration_sec: req.duration_sec,
            })
            .await?;

        record_attempt("lesson", attempt.correctness >= 1.0);
        tracing::info!(
            "Lesson attempt recorded: id={}, student={}, lesson={}, correctness={:.2}",
            attempt.id,
            attempt.student_id,
            attempt.lesson_id,
            attempt.correctness
        );

        Ok(attempt)
    }

    pub async fn record_question_attempt(
        &self,
        req: &CreateQuestionAttemptRequest,
        now: DateTime<Utc>,
    ) -> Result<QuestionAttempt, AttemptError> {
        self.ensure_student(req.student_id).await?;
        let question = self
            .store
            .find_question(req.question_id)
            .await?
            .ok_or(AttemptError::QuestionNotFound(req.question_id))?;

        let points_earned = points_for_answer(question.points, req.is_correct, req.hints_used);

        let attempt = self
            .store
            .insert_question_attempt(NewQuestionAttempt {
                student_id: req.student_id,
                question_id: question.id,
                lesson_id: question.lesson_id,
                timestamp: now,
                answer: req.answer.clone(),
                is_correct: req.is_correct,
                hints_used: req.hints_used,
                duration_sec: req.duration_sec,
                points_earned,
            })
            .await?;

        record_attempt("question", attempt.is_correct);
        tracing::info!(
            "Question attempt recorded: id={}, student={}, question={}, correct={}, points={}",
            attempt.id,
            attempt.student_id,
            attempt.question_id,
            attempt.is_correct,
            attempt.points_earned
        );

        Ok(attempt)
    }

    pub async fn list_question_attempts(
        &self,
        student_id: i64,
    ) -> Result<Vec<QuestionAttempt>, AttemptError> {
        self.ensure_student(student_id).await?;
        Ok(self.store.list_student_question_attempts(student_id).await?)
    }

    async fn ensure_student(&self, student_id: i64) -> Result<(), AttemptError> {
        if self.store.student_exists(student_id).await? {
            Ok(())
        } else {
            Err(AttemptError::StudentNotFound(student_id))
        }
    }
}

/// Correct answers earn the question's points minus hint penalties, never below zero.
pub fn points_for_answer(question_points: i64, is_correct: bool, hints_used: u32) -> i64 {
    if !is_correct {
        return 0;
    }
    (question_points - i64::from(hints_used) * HINT_PENALTY_POINTS).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        catalog::{Course, LessonRecord, Question, QuestionType},
        student::Student,
    };
    use crate::services::learning_store::{AttemptStore, InMemoryLearningStore};

    #[test]
    fn test_points_for_answer() {
        assert_eq!(points_for_answer(10, true, 0), 10);
        assert_eq!(points_for_answer(10, true, 2), 6);
        assert_eq!(points_for_answer(10, true, 9), 0);
        assert_eq!(points_for_answer(10, false, 0), 0);
    }

    async fn store() -> Arc<InMemoryLearningStore> {
        let store = Arc::new(InMemoryLearningStore::new());
        store
            .insert_student(Student {
                id: 1,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                created_at: Utc::now(),
            })
            .await;
        store
            .insert_course(Course {
                id: 1,
                name: "Python 101".to_string(),
                description: "Learn Python".to_string(),
                difficulty: 2,
            })
            .await;
        store
            .insert_lesson(LessonRecord {
                id: 3,
                course_id: 1,
                title: "Loops".to_string(),
                tags: vec!["python".to_string(), "loops".to_string()],
                order_index: 2,
            })
            .await;
        store
            .insert_question(Question {
                id: 5,
                lesson_id: 3,
                question_type: QuestionType::Text,
                title: "Range".to_string(),
                content: "What does range(3) yield?".to_string(),
                options: None,
                correct_answer: serde_json::json!("0, 1, 2"),
                difficulty: 1,
                points: 10,
                order_index: 1,
                tags: Vec::new(),
            })
            .await;
        store
    }

    #[tokio::test]
    async fn test_question_attempt_copies_lesson_and_scores_points() {
        let store = store().await;
        let service = AttemptService::new(store.clone());

        let attempt = service
            .record_question_attempt(
                &CreateQuestionAttemptRequest {
                    student_id: 1,
                    question_id: 5,
                    answer: serde_json::json!("0, 1, 2"),
                    is_correct: true,
                    hints_used: 1,
                    duration_sec: 42,
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(attempt.lesson_id, 3);
        assert_eq!(attempt.points_earned, 8);
        assert_eq!(store.get_question_attempts(1, 3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_references_are_rejected() {
        let store = store().await;
        let service = AttemptService::new(store.clone());

        let err = service
            .record_lesson_attempt(
                &CreateLessonAttemptRequest {
                    student_id: 2,
                    lesson_id: 3,
                    correctness: 0.5,
                    hints_used: 0,
                    duration_sec: 60,
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::StudentNotFound(2)));

        let err = service
            .record_lesson_attempt(
                &CreateLessonAttemptRequest {
                    student_id: 1,
                    lesson_id: 42,
                    correctness: 0.5,
                    hints_used: 0,
                    duration_sec: 60,
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::LessonNotFound(42)));
    }
}
