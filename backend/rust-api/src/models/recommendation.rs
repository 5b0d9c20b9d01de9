use serde::{Serialize, Serializer};

/// Which attempt history the windowed metrics of a lesson were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvidenceSource {
    #[default]
    None,
    LessonAttempts,
    QuestionAttempts,
}

/// Per-lesson feature bundle reported alongside a recommendation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LessonFeatures {
    /// Whole days since the last attempt of either kind, 999 when never attempted
    pub time_since_last_activity: i64,
    pub avg_correctness_7d: f64,
    pub avg_correctness_30d: f64,
    pub attempts_to_completion_ratio: f64,
    pub question_completion_ratio: f64,
    pub combined_progress: f64,
    pub progress_gap: f64,
    pub mastery_gap: f64,
    /// Raw drift; negative values mean the lesson sits below the student's level
    pub difficulty_drift: f64,
    pub performance_indicator: f64,
    pub hints_rate: f64,
    pub question_attempts_3d: u32,
    pub question_attempts_7d: u32,
    pub recent_activity_boost: f64,
    #[serde(skip)]
    pub evidence: EvidenceSource,
}

impl LessonFeatures {
    pub fn has_question_attempts(&self) -> bool {
        self.evidence == EvidenceSource::QuestionAttempts
    }
}

/// Scored lesson for one student. Lives only for the duration of a recommendation call.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonSignal {
    pub lesson_id: i64,
    pub title: String,
    pub features: LessonFeatures,
    pub score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeRecommendation {
    pub lesson: String,
    pub confidence: f64,
    pub features: LessonFeatures,
}

impl From<LessonSignal> for AlternativeRecommendation {
    fn from(signal: LessonSignal) -> Self {
        Self {
            lesson: signal.title,
            confidence: signal.confidence,
            features: signal.features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResponse {
    pub recommendation: Option<String>,
    #[serde(serialize_with = "features_or_empty")]
    pub reason_features: Option<LessonFeatures>,
    pub confidence: f64,
    pub alternatives: Vec<AlternativeRecommendation>,
}

impl RecommendationResponse {
    pub fn empty() -> Self {
        Self {
            recommendation: None,
            reason_features: None,
            confidence: 0.0,
            alternatives: Vec::new(),
        }
    }
}

// An empty catalog still reports `reason_features` as an (empty) object.
fn features_or_empty<S>(features: &Option<LessonFeatures>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match features {
        Some(features) => features.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}
