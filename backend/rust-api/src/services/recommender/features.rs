//! Per-lesson feature extraction.
//!
//! Every function here is pure: the same snapshot and the same `now` always
//! produce the same [`LessonFeatures`].

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    attempt::{LessonAttempt, QuestionAttempt},
    catalog::{CatalogLesson, QuestionTotals},
    recommendation::{EvidenceSource, LessonFeatures},
};

/// Reported as `time_since_last_activity` for lessons the student never touched.
pub const NEVER_ATTEMPTED_DAYS: i64 = 999;
pub const SHORT_WINDOW_DAYS: i64 = 7;
pub const LONG_WINDOW_DAYS: i64 = 30;
pub const VERY_RECENT_WINDOW_DAYS: i64 = 3;

const TYPICAL_HINTS_PER_QUESTION: f64 = 3.0;
const BOOST_PER_RECENT_ATTEMPT: f64 = 0.3;
const MAX_RECENT_ACTIVITY_BOOST: f64 = 1.0;
const MAX_DIFFICULTY: f64 = 5.0;

/// Everything the engine knows about one lesson for one student.
#[derive(Debug, Clone)]
pub struct LessonSnapshot {
    pub lesson: CatalogLesson,
    pub lesson_attempts: Vec<LessonAttempt>,
    pub question_attempts: Vec<QuestionAttempt>,
    pub totals: QuestionTotals,
}

impl LessonSnapshot {
    pub fn untouched(lesson: CatalogLesson, totals: QuestionTotals) -> Self {
        Self {
            lesson,
            lesson_attempts: Vec::new(),
            question_attempts: Vec::new(),
            totals,
        }
    }

    /// History as it was known at `now`; attempts stamped later are dropped.
    pub fn as_of(&self, now: DateTime<Utc>) -> Self {
        Self {
            lesson: self.lesson.clone(),
            lesson_attempts: self
                .lesson_attempts
                .iter()
                .filter(|attempt| attempt.timestamp <= now)
                .cloned()
                .collect(),
            question_attempts: self
                .question_attempts
                .iter()
                .filter(|attempt| attempt.timestamp <= now)
                .cloned()
                .collect(),
            totals: self.totals,
        }
    }

    fn evidence(&self) -> EvidenceSource {
        if !self.question_attempts.is_empty() {
            EvidenceSource::QuestionAttempts
        } else if !self.lesson_attempts.is_empty() {
            EvidenceSource::LessonAttempts
        } else {
            EvidenceSource::None
        }
    }

    fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.lesson_attempts
            .iter()
            .map(|attempt| attempt.timestamp)
            .chain(self.question_attempts.iter().map(|attempt| attempt.timestamp))
            .max()
    }

    fn question_attempts_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Iterator<Item = &QuestionAttempt> {
        self.question_attempts
            .iter()
            .filter(move |attempt| attempt.timestamp >= since)
    }

    fn lesson_attempts_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Iterator<Item = &LessonAttempt> {
        self.lesson_attempts
            .iter()
            .filter(move |attempt| attempt.timestamp >= since)
    }
}

pub fn extract_features(snapshot: &LessonSnapshot, now: DateTime<Utc>) -> LessonFeatures {
    let snapshot = &snapshot.as_of(now);
    let evidence = snapshot.evidence();
    let attempted = evidence != EvidenceSource::None;

    let time_since_last_activity = snapshot
        .last_activity()
        .map_or(NEVER_ATTEMPTED_DAYS, |last| (now - last).num_days());

    let avg_correctness_7d = windowed_correctness(snapshot, evidence, now, SHORT_WINDOW_DAYS);
    let avg_correctness_30d = windowed_correctness(snapshot, evidence, now, LONG_WINDOW_DAYS);

    let attempts_to_completion_ratio =
        snapshot.lesson_attempts.len() as f64 / f64::from(snapshot.lesson.order_index.max(1));
    let distinct_questions: HashSet<i64> = snapshot
        .question_attempts
        .iter()
        .map(|attempt| attempt.question_id)
        .collect();
    let question_completion_ratio =
        distinct_questions.len() as f64 / f64::from(snapshot.totals.total_questions.max(1));
    // The legacy ratio may exceed 1 and is not clamped.
    let combined_progress = (attempts_to_completion_ratio + question_completion_ratio) / 2.0;
    let progress_gap = if attempted {
        1.0 - combined_progress
    } else {
        1.0
    };

    let mastery_gap = if attempted { 0.5 } else { 1.0 };

    let performance_indicator = match evidence {
        EvidenceSource::QuestionAttempts => {
            let earned: i64 = snapshot
                .question_attempts
                .iter()
                .map(|attempt| attempt.points_earned)
                .sum();
            earned as f64 / snapshot.totals.total_points.max(1) as f64
        }
        _ => avg_correctness_30d,
    };
    let difficulty_drift =
        f64::from(snapshot.lesson.course_difficulty) / MAX_DIFFICULTY - performance_indicator;

    let hints_rate = match evidence {
        EvidenceSource::QuestionAttempts => {
            let avg = mean(
                snapshot
                    .question_attempts
                    .iter()
                    .map(|attempt| f64::from(attempt.hints_used)),
            );
            (avg / TYPICAL_HINTS_PER_QUESTION).min(1.0)
        }
        EvidenceSource::LessonAttempts => mean(
            snapshot
                .lesson_attempts
                .iter()
                .map(|attempt| f64::from(attempt.hints_used)),
        ),
        EvidenceSource::None => 0.0,
    };

    let question_attempts_7d = snapshot
        .question_attempts_since(now - Duration::days(SHORT_WINDOW_DAYS))
        .count() as u32;
    let question_attempts_3d = snapshot
        .question_attempts_since(now - Duration::days(VERY_RECENT_WINDOW_DAYS))
        .count() as u32;
    let recent_activity_boost =
        (f64::from(question_attempts_7d) * BOOST_PER_RECENT_ATTEMPT).min(MAX_RECENT_ACTIVITY_BOOST);

    LessonFeatures {
        time_since_last_activity,
        avg_correctness_7d,
        avg_correctness_30d,
        attempts_to_completion_ratio,
        question_completion_ratio,
        combined_progress,
        progress_gap,
        mastery_gap,
        difficulty_drift,
        performance_indicator,
        hints_rate,
        question_attempts_3d,
        question_attempts_7d,
        recent_activity_boost,
        evidence,
    }
}

/// Question attempts win over lesson attempts whenever the lesson has any.
/// An empty window counts as zero correctness.
fn windowed_correctness(
    snapshot: &LessonSnapshot,
    evidence: EvidenceSource,
    now: DateTime<Utc>,
    days: i64,
) -> f64 {
    let since = now - Duration::days(days);
    match evidence {
        EvidenceSource::QuestionAttempts => mean(
            snapshot
                .question_attempts_since(since)
                .map(|attempt| if attempt.is_correct { 1.0 } else { 0.0 }),
        ),
        EvidenceSource::LessonAttempts => mean(
            snapshot
                .lesson_attempts_since(since)
                .map(|attempt| attempt.correctness),
        ),
        EvidenceSource::None => 0.0,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
