//! Next-lesson recommender.
//!
//! The service reads one immutable snapshot of the catalog and the student's
//! attempt history through the store traits, then hands it to the pure
//! engine. Nothing is cached between calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::metrics::{
    RECOMMENDATIONS_TOTAL, RECOMMENDATION_CONFIDENCE, RECOMMENDATION_DURATION_SECONDS,
};
use crate::models::recommendation::RecommendationResponse;
use crate::services::learning_store::{LearningStore, StoreError};

pub mod engine;
pub mod features;
pub mod scoring;

pub use features::LessonSnapshot;
pub use scoring::ScoringWeights;

pub struct RecommendationService {
    store: Arc<dyn LearningStore>,
    weights: ScoringWeights,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self {
            store,
            weights: ScoringWeights::default(),
        }
    }

    /// Reads every lesson of the catalog together with the student's history for it.
    /// The caller is expected to have verified that the student exists.
    pub async fn load_snapshot(
        &self,
        student_id: i64,
    ) -> Result<Vec<LessonSnapshot>, StoreError> {
        let lessons = self.store.get_all_lessons().await?;
        let mut snapshots = Vec::with_capacity(lessons.len());

        for lesson in lessons {
            let lesson_attempts = self
                .store
                .get_lesson_attempts(student_id, lesson.id)
                .await?;
            let question_attempts = self
                .store
                .get_question_attempts(student_id, lesson.id)
                .await?;
            let totals = self.store.get_question_totals(lesson.id).await?;

            snapshots.push(LessonSnapshot {
                lesson,
                lesson_attempts,
                question_attempts,
                totals,
            });
        }

        Ok(snapshots)
    }

    pub async fn recommend(
        &self,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<RecommendationResponse, StoreError> {
        let timer = RECOMMENDATION_DURATION_SECONDS.start_timer();

        let snapshots = match self.load_snapshot(student_id).await {
            Ok(snapshots) => snapshots,
            Err(err) => {
                RECOMMENDATIONS_TOTAL.with_label_values(&["error"]).inc();
                return Err(err);
            }
        };

        let ranked = engine::rank_lessons(&snapshots, now, &self.weights);
        if let Some(top) = ranked.first() {
            tracing::debug!(
                student_id,
                lesson_id = top.lesson_id,
                score = top.score,
                confidence = top.confidence,
                "Top lesson selected"
            );
        }

        let response = engine::build_response(ranked);
        timer.observe_duration();

        match &response.recommendation {
            Some(lesson) => {
                RECOMMENDATIONS_TOTAL.with_label_values(&["ok"]).inc();
                RECOMMENDATION_CONFIDENCE.observe(response.confidence);
                tracing::info!(
                    "Recommendation computed: student={}, lesson={}, confidence={:.2}, lessons_scored={}",
                    student_id,
                    lesson,
                    response.confidence,
                    snapshots.len()
                );
            }
            None => {
                RECOMMENDATIONS_TOTAL
                    .with_label_values(&["empty_catalog"])
                    .inc();
                tracing::info!(
                    "Recommendation skipped: student={}, catalog is empty",
                    student_id
                );
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{
        attempt::NewQuestionAttempt,
        catalog::{Course, LessonRecord, Question, QuestionType},
    };
    use crate::services::learning_store::{AttemptStore, InMemoryLearningStore};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    async fn seeded_store() -> Arc<InMemoryLearningStore> {
        let store = Arc::new(InMemoryLearningStore::new());
        store
            .insert_course(Course {
                id: 1,
                name: "Rust Basics".to_string(),
                description: "Ownership and borrowing".to_string(),
                difficulty: 3,
            })
            .await;
        for (id, title) in [(1, "Variables"), (2, "Ownership")] {
            store
                .insert_lesson(LessonRecord {
                    id,
                    course_id: 1,
                    title: title.to_string(),
                    tags: vec!["rust".to_string()],
                    order_index: id as i32,
                })
                .await;
            store
                .insert_question(Question {
                    id: id * 10,
                    lesson_id: id,
                    question_type: QuestionType::Mcq,
                    title: format!("{} check", title),
                    content: "Pick one".to_string(),
                    options: Some(vec!["A".to_string(), "B".to_string()]),
                    correct_answer: serde_json::json!(["A"]),
                    difficulty: 1,
                    points: 10,
                    order_index: 1,
                    tags: Vec::new(),
                })
                .await;
        }
        store
    }

    #[tokio::test]
    async fn test_snapshot_contains_every_lesson_with_totals() {
        let store = seeded_store().await;
        let service = RecommendationService::new(store.clone());

        let snapshots = service.load_snapshot(7).await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(|snapshot| snapshot.totals.total_questions == 1));
        assert!(snapshots.iter().all(|snapshot| snapshot.lesson_attempts.is_empty()));
    }

    #[tokio::test]
    async fn test_fresh_question_attempt_moves_lesson_to_top() {
        let store = seeded_store().await;
        store
            .insert_question_attempt(NewQuestionAttempt {
                student_id: 7,
                question_id: 10,
                lesson_id: 1,
                timestamp: now() - Duration::hours(2),
                answer: serde_json::json!(["A"]),
                is_correct: true,
                hints_used: 0,
                duration_sec: 25,
                points_earned: 10,
            })
            .await
            .unwrap();

        let service = RecommendationService::new(store.clone());
        let response = service.recommend(7, now()).await.unwrap();

        assert_eq!(response.recommendation.as_deref(), Some("Variables"));
        let features = response.reason_features.unwrap();
        assert_eq!(features.time_since_last_activity, 0);
        assert_eq!(features.question_completion_ratio, 1.0);
        assert_eq!(response.alternatives.len(), 1);
        assert_eq!(response.alternatives[0].lesson, "Ownership");
    }

    #[tokio::test]
    async fn test_history_of_other_students_is_ignored() {
        let store = seeded_store().await;
        store
            .insert_question_attempt(NewQuestionAttempt {
                student_id: 99,
                question_id: 10,
                lesson_id: 1,
                timestamp: now(),
                answer: serde_json::Value::Null,
                is_correct: true,
                hints_used: 0,
                duration_sec: 10,
                points_earned: 10,
            })
            .await
            .unwrap();

        let service = RecommendationService::new(store.clone());
        let response = service.recommend(7, now()).await.unwrap();

        // without history the higher lesson variation wins
        assert_eq!(response.recommendation.as_deref(), Some("Ownership"));
        assert_eq!(
            response.reason_features.unwrap().time_since_last_activity,
            features::NEVER_ATTEMPTED_DAYS
        );
    }
}
