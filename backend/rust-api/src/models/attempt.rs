use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Coarse-grained record of a student working through a whole lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonAttempt {
    #[serde(rename = "_id")]
    pub id: i64,
    pub student_id: i64,
    pub lesson_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Fraction of the lesson answered correctly, 0..=1
    pub correctness: f64,
    pub hints_used: u32,
    pub duration_sec: u32,
}

/// Answer to a single question. `lesson_id` is copied from the question on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAttempt {
    #[serde(rename = "_id")]
    pub id: i64,
    pub student_id: i64,
    pub question_id: i64,
    pub lesson_id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub answer: serde_json::Value,
    pub is_correct: bool,
    pub hints_used: u32,
    pub duration_sec: u32,
    pub points_earned: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonAttemptRequest {
    pub student_id: i64,
    pub lesson_id: i64,
    #[validate(range(min = 0.0, max = 1.0, message = "correctness must be within [0, 1]"))]
    pub correctness: f64,
    #[serde(default)]
    pub hints_used: u32,
    #[validate(range(min = 1, message = "duration_sec must be positive"))]
    pub duration_sec: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionAttemptRequest {
    pub student_id: i64,
    pub question_id: i64,
    #[serde(default)]
    pub answer: serde_json::Value,
    pub is_correct: bool,
    #[serde(default)]
    pub hints_used: u32,
    #[validate(range(min = 1, message = "duration_sec must be positive"))]
    pub duration_sec: u32,
}

/// Lesson attempt without an id; the store assigns one on insert.
#[derive(Debug, Clone)]
pub struct NewLessonAttempt {
    pub student_id: i64,
    pub lesson_id: i64,
    pub timestamp: DateTime<Utc>,
    pub correctness: f64,
    pub hints_used: u32,
    pub duration_sec: u32,
}

impl NewLessonAttempt {
    pub fn with_id(self, id: i64) -> LessonAttempt {
        LessonAttempt {
            id,
            student_id: self.student_id,
            lesson_id: self.lesson_id,
            timestamp: self.timestamp,
            correctness: self.correctness,
            hints_used: self.hints_used,
            duration_sec: self.duration_sec,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewQuestionAttempt {
    pub student_id: i64,
    pub question_id: i64,
    pub lesson_id: i64,
    pub timestamp: DateTime<Utc>,
    pub answer: serde_json::Value,
    pub is_correct: bool,
    pub hints_used: u32,
    pub duration_sec: u32,
    pub points_earned: i64,
}

impl NewQuestionAttempt {
    pub fn with_id(self, id: i64) -> QuestionAttempt {
        QuestionAttempt {
            id,
            student_id: self.student_id,
            question_id: self.question_id,
            lesson_id: self.lesson_id,
            timestamp: self.timestamp,
            answer: self.answer,
            is_correct: self.is_correct,
            hints_used: self.hints_used,
            duration_sec: self.duration_sec,
            points_earned: self.points_earned,
        }
    }
}
