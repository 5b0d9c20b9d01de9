//! Score and confidence for a single lesson.

use crate::models::recommendation::{EvidenceSource, LessonFeatures};

pub const MIN_CONFIDENCE: f64 = 0.10;
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Inactivity beyond this many days counts as fully stale.
const RECENCY_HORIZON_DAYS: f64 = 30.0;

const BASE_CONFIDENCE: f64 = 0.30;
const MAX_RECENT_ACTIVITY_FACTOR: f64 = 0.25;
const PER_ATTEMPT_LAST_3D: f64 = 0.05;
const PER_ATTEMPT_LAST_7D: f64 = 0.02;
const PERFORMANCE_WEIGHT: f64 = 0.20;
const VARIATION_MODULUS: i64 = 7;
const VARIATION_STEP: f64 = 0.02;

/// Weights of the score components. Lower scores are recommended first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub recency: f64,
    pub progress_gap: f64,
    pub mastery_gap: f64,
    pub short_window_error: f64,
    pub difficulty_drift: f64,
    pub hint_dependency: f64,
    pub question_coverage_gap: f64,
}

pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    recency: 0.25,
    progress_gap: 0.15,
    mastery_gap: 0.10,
    short_window_error: 0.15,
    difficulty_drift: 0.10,
    hint_dependency: 0.15,
    question_coverage_gap: 0.10,
};

impl Default for ScoringWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl ScoringWeights {
    /// Weighted sum of normalised features minus the recent activity boost.
    /// Not clamped: the value is only ever compared against other scores.
    pub fn score(&self, features: &LessonFeatures) -> f64 {
        let recency = (features.time_since_last_activity as f64 / RECENCY_HORIZON_DAYS).min(1.0);

        self.recency * recency
            + self.progress_gap * features.progress_gap
            + self.mastery_gap * features.mastery_gap
            + self.short_window_error * (1.0 - features.avg_correctness_7d)
            // only drift towards "too hard" is penalised
            + self.difficulty_drift * features.difficulty_drift.max(0.0)
            + self.hint_dependency * features.hints_rate
            + self.question_coverage_gap * (1.0 - features.question_completion_ratio)
            - features.recent_activity_boost
    }
}

/// Certainty in a recommendation, driven by how much recent data backs it.
/// Always within `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.
pub fn confidence(features: &LessonFeatures, lesson_id: i64) -> f64 {
    let total = BASE_CONFIDENCE
        + recent_activity_factor(features)
        + data_freshness_factor(features)
        + performance_factor(features)
        + lesson_variation(lesson_id);

    total.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Fixed per-lesson offset so otherwise tied lessons rank the same way on every call.
pub fn lesson_variation(lesson_id: i64) -> f64 {
    lesson_id.rem_euclid(VARIATION_MODULUS) as f64 * VARIATION_STEP
}

fn recent_activity_factor(features: &LessonFeatures) -> f64 {
    if !features.has_question_attempts() {
        return 0.0;
    }
    let activity = f64::from(features.question_attempts_3d) * PER_ATTEMPT_LAST_3D
        + f64::from(features.question_attempts_7d) * PER_ATTEMPT_LAST_7D;
    activity.min(MAX_RECENT_ACTIVITY_FACTOR)
}

fn data_freshness_factor(features: &LessonFeatures) -> f64 {
    if features.evidence == EvidenceSource::None {
        return 0.0;
    }
    match features.time_since_last_activity {
        days if days <= 1 => 0.15,
        days if days <= 3 => 0.10,
        days if days <= 7 => 0.05,
        _ => 0.02,
    }
}

fn performance_factor(features: &LessonFeatures) -> f64 {
    if features.has_question_attempts() {
        features.avg_correctness_7d * PERFORMANCE_WEIGHT
    } else {
        0.0
    }
}
