use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub description: String,
    /// 1 (easiest) to 5
    pub difficulty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    #[serde(rename = "_id")]
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub order_index: i32,
}

/// Lesson joined with the difficulty of its course, as consumed by the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogLesson {
    pub id: i64,
    pub title: String,
    pub course_id: i64,
    pub course_difficulty: i32,
    pub order_index: i32,
}

impl CatalogLesson {
    pub fn from_record(record: &LessonRecord, course_difficulty: i32) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            course_id: record.course_id,
            course_difficulty,
            order_index: record.order_index,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Mcq,
    Coding,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: i64,
    pub lesson_id: i64,
    #[serde(default)]
    pub question_type: QuestionType,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub correct_answer: serde_json::Value,
    #[serde(default = "default_question_difficulty")]
    pub difficulty: i32,
    #[serde(default = "default_question_points")]
    pub points: i64,
    pub order_index: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_question_difficulty() -> i32 {
    1
}

fn default_question_points() -> i64 {
    10
}

/// Public projection of a question; never carries the expected answer.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub lesson_id: i64,
    pub question_type: QuestionType,
    pub title: String,
    pub content: String,
    pub options: Option<Vec<String>>,
    pub difficulty: i32,
    pub points: i64,
    pub order_index: i32,
    pub tags: Vec<String>,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            lesson_id: question.lesson_id,
            question_type: question.question_type,
            title: question.title,
            content: question.content,
            options: question.options,
            difficulty: question.difficulty,
            points: question.points,
            order_index: question.order_index,
            tags: question.tags,
        }
    }
}

/// Question count and achievable points for one lesson.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTotals {
    pub total_questions: u32,
    pub total_points: i64,
}

impl QuestionTotals {
    pub fn from_questions<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Self {
        questions
            .into_iter()
            .fold(QuestionTotals::default(), |mut totals, question| {
                totals.total_questions += 1;
                totals.total_points += question.points;
                totals
            })
    }
}
