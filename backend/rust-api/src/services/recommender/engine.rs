use chrono::{DateTime, Utc};

use super::{
    features::{extract_features, LessonSnapshot},
    scoring::{confidence, ScoringWeights},
};
use crate::models::recommendation::{LessonSignal, RecommendationResponse};

pub const MAX_ALTERNATIVES: usize = 2;

pub fn evaluate_lesson(
    snapshot: &LessonSnapshot,
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> LessonSignal {
    let features = extract_features(snapshot, now);
    let score = weights.score(&features);
    let confidence = confidence(&features, snapshot.lesson.id);

    LessonSignal {
        lesson_id: snapshot.lesson.id,
        title: snapshot.lesson.title.clone(),
        features,
        score,
        confidence,
    }
}

/// Scores every lesson and orders them by confidence, highest first.
/// The sort is stable, so equal confidences keep catalog order.
pub fn rank_lessons(
    snapshots: &[LessonSnapshot],
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> Vec<LessonSignal> {
    let mut signals: Vec<LessonSignal> = snapshots
        .iter()
        .map(|snapshot| evaluate_lesson(snapshot, now, weights))
        .collect();
    signals.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    signals
}

pub fn build_response(ranked: Vec<LessonSignal>) -> RecommendationResponse {
    let mut ranked = ranked.into_iter();
    let Some(top) = ranked.next() else {
        return RecommendationResponse::empty();
    };

    RecommendationResponse {
        recommendation: Some(top.title),
        reason_features: Some(top.features),
        confidence: top.confidence,
        alternatives: ranked.take(MAX_ALTERNATIVES).map(Into::into).collect(),
    }
}

pub fn recommend(
    snapshots: &[LessonSnapshot],
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> RecommendationResponse {
    build_response(rank_lessons(snapshots, now, weights))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{
        attempt::{LessonAttempt, QuestionAttempt},
        catalog::{CatalogLesson, QuestionTotals},
    };
    use crate::services::recommender::{
        features::NEVER_ATTEMPTED_DAYS,
        scoring::{MAX_CONFIDENCE, MIN_CONFIDENCE},
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 12, 10, 0, 0, 0).unwrap()
    }

    fn catalog(count: i64) -> Vec<LessonSnapshot> {
        (1..=count)
            .map(|id| {
                LessonSnapshot::untouched(
                    CatalogLesson {
                        id,
                        title: format!("Lesson {}", id),
                        course_id: 1,
                        course_difficulty: 2,
                        order_index: id as i32,
                    },
                    QuestionTotals::default(),
                )
            })
            .collect()
    }

    fn lesson_attempt(lesson_id: i64, day: u32, correctness: f64) -> LessonAttempt {
        LessonAttempt {
            id: lesson_id,
            student_id: 1,
            lesson_id,
            timestamp: Utc.with_ymd_and_hms(2021, 12, day, 0, 0, 0).unwrap(),
            correctness,
            hints_used: 1,
            duration_sec: 300,
        }
    }

    fn scenario() -> Vec<LessonSnapshot> {
        let mut snapshots = catalog(5);
        snapshots[0].lesson_attempts = vec![lesson_attempt(1, 1, 0.5)];
        snapshots[1].lesson_attempts = vec![lesson_attempt(2, 2, 0.7)];
        snapshots[2].lesson_attempts = vec![lesson_attempt(3, 3, 0.9)];
        snapshots
    }

    fn assert_ranked(response: &RecommendationResponse) {
        let mut previous = response.confidence;
        for alternative in &response.alternatives {
            assert!(alternative.confidence <= previous);
            previous = alternative.confidence;
        }
    }

    #[test]
    fn test_empty_catalog_yields_empty_response() {
        let response = recommend(&[], now(), &ScoringWeights::default());

        assert_eq!(response.recommendation, None);
        assert_eq!(response.reason_features, None);
        assert_eq!(response.confidence, 0.0);
        assert!(response.alternatives.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["reason_features"], serde_json::json!({}));
        assert!(json["recommendation"].is_null());
    }

    #[test]
    fn test_alternative_count_follows_catalog_size() {
        for size in 0..=6 {
            let response = recommend(&catalog(size), now(), &ScoringWeights::default());
            let expected = (size - 1).clamp(0, MAX_ALTERNATIVES as i64) as usize;
            assert_eq!(response.alternatives.len(), expected, "catalog of {}", size);
        }
    }

    #[test]
    fn test_scenario_from_partial_history() {
        let snapshots = scenario();
        let ranked = rank_lessons(&snapshots, now(), &ScoringWeights::default());

        assert_eq!(ranked.len(), 5);
        for signal in &ranked {
            assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&signal.confidence));
            if signal.lesson_id >= 4 {
                assert_eq!(signal.features.time_since_last_activity, NEVER_ATTEMPTED_DAYS);
                assert_eq!(signal.features.mastery_gap, 1.0);
                assert_eq!(signal.features.progress_gap, 1.0);
            }
        }

        let response = build_response(ranked);
        assert!(response.recommendation.is_some());
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&response.confidence));
        assert_eq!(response.alternatives.len(), 2);
        assert_ranked(&response);
    }

    #[test]
    fn test_scenario_ranking_is_driven_by_variation_and_freshness() {
        // lessons 1-3 were last touched 9, 8 and 7 days before "now"
        let ranked = rank_lessons(&scenario(), now(), &ScoringWeights::default());
        let order: Vec<i64> = ranked.iter().map(|signal| signal.lesson_id).collect();

        // 1: 0.30+0.02+0.02, 2: 0.30+0.02+0.04, 3: 0.30+0.05+0.06,
        // 4: 0.30+0.08, 5: 0.30+0.10
        assert_eq!(order, vec![3, 5, 4, 2, 1]);
        assert_eq!(ranked[0].features.time_since_last_activity, 7);
        assert!((ranked[0].confidence - 0.41).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let mut snapshots = scenario();
        snapshots[4].question_attempts = vec![QuestionAttempt {
            id: 1,
            student_id: 1,
            question_id: 9,
            lesson_id: 5,
            timestamp: now() - Duration::hours(5),
            answer: serde_json::json!(["A"]),
            is_correct: true,
            hints_used: 1,
            duration_sec: 40,
            points_earned: 8,
        }];

        let first = recommend(&snapshots, now(), &ScoringWeights::default());
        let second = recommend(&snapshots, now(), &ScoringWeights::default());
        assert_eq!(first, second);
        assert_eq!(first.recommendation.as_deref(), Some("Lesson 5"));
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        // ids 1 and 8 share the same variation and have no history
        let mut snapshots = catalog(1);
        snapshots.push(LessonSnapshot::untouched(
            CatalogLesson {
                id: 8,
                title: "Lesson 8".to_string(),
                course_id: 2,
                course_difficulty: 3,
                order_index: 1,
            },
            QuestionTotals::default(),
        ));

        let ranked = rank_lessons(&snapshots, now(), &ScoringWeights::default());
        assert_eq!(ranked[0].confidence, ranked[1].confidence);
        assert_eq!(ranked[0].lesson_id, 1);

        snapshots.reverse();
        let ranked = rank_lessons(&snapshots, now(), &ScoringWeights::default());
        assert_eq!(ranked[0].lesson_id, 8);
    }
}
