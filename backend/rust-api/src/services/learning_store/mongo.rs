use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    Collection, Database,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{AttemptStore, CatalogStore, LearningStore, StoreError};
use crate::metrics::track_db_operation;
use crate::models::{
    attempt::{LessonAttempt, NewLessonAttempt, NewQuestionAttempt, QuestionAttempt},
    catalog::{CatalogLesson, Course, LessonRecord, Question, QuestionTotals},
    student::Student,
};

pub const STUDENTS: &str = "students";
pub const COURSES: &str = "courses";
pub const LESSONS: &str = "lessons";
pub const QUESTIONS: &str = "questions";
pub const LESSON_ATTEMPTS: &str = "attempts";
pub const QUESTION_ATTEMPTS: &str = "question_attempts";

/// Stored shape of a lesson attempt. `timestamp` is a BSON date so that
/// `sort({timestamp: -1})` is chronological rather than lexical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonAttemptDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub student_id: i64,
    pub lesson_id: i64,
    pub timestamp: BsonDateTime,
    pub correctness: f64,
    pub hints_used: u32,
    pub duration_sec: u32,
}

impl From<&LessonAttempt> for LessonAttemptDocument {
    fn from(attempt: &LessonAttempt) -> Self {
        Self {
            id: attempt.id,
            student_id: attempt.student_id,
            lesson_id: attempt.lesson_id,
            timestamp: to_bson_datetime(attempt.timestamp),
            correctness: attempt.correctness,
            hints_used: attempt.hints_used,
            duration_sec: attempt.duration_sec,
        }
    }
}

impl TryFrom<LessonAttemptDocument> for LessonAttempt {
    type Error = StoreError;

    fn try_from(document: LessonAttemptDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: document.id,
            student_id: document.student_id,
            lesson_id: document.lesson_id,
            timestamp: from_bson_datetime(document.timestamp)?,
            correctness: document.correctness,
            hints_used: document.hints_used,
            duration_sec: document.duration_sec,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAttemptDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub student_id: i64,
    pub question_id: i64,
    pub lesson_id: i64,
    pub timestamp: BsonDateTime,
    #[serde(default)]
    pub answer: serde_json::Value,
    pub is_correct: bool,
    pub hints_used: u32,
    pub duration_sec: u32,
    pub points_earned: i64,
}

impl From<&QuestionAttempt> for QuestionAttemptDocument {
    fn from(attempt: &QuestionAttempt) -> Self {
        Self {
            id: attempt.id,
            student_id: attempt.student_id,
            question_id: attempt.question_id,
            lesson_id: attempt.lesson_id,
            timestamp: to_bson_datetime(attempt.timestamp),
            answer: attempt.answer.clone(),
            is_correct: attempt.is_correct,
            hints_used: attempt.hints_used,
            duration_sec: attempt.duration_sec,
            points_earned: attempt.points_earned,
        }
    }
}

impl TryFrom<QuestionAttemptDocument> for QuestionAttempt {
    type Error = StoreError;

    fn try_from(document: QuestionAttemptDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: document.id,
            student_id: document.student_id,
            question_id: document.question_id,
            lesson_id: document.lesson_id,
            timestamp: from_bson_datetime(document.timestamp)?,
            answer: document.answer,
            is_correct: document.is_correct,
            hints_used: document.hints_used,
            duration_sec: document.duration_sec,
            points_earned: document.points_earned,
        })
    }
}

/// Millisecond precision, matching what MongoDB stores for dates.
pub fn to_bson_datetime(timestamp: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(timestamp.timestamp_millis())
}

fn from_bson_datetime(timestamp: BsonDateTime) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(timestamp.timestamp_millis()).ok_or_else(|| {
        StoreError::Decode(format!(
            "timestamp {} is out of range",
            timestamp.timestamp_millis()
        ))
    })
}

fn decode_all<D, T>(documents: Vec<D>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<D, Error = StoreError>,
{
    documents.into_iter().map(T::try_from).collect()
}

#[derive(Clone)]
pub struct MongoLearningStore {
    mongo: Database,
}

impl MongoLearningStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.mongo.collection::<T>(name)
    }

    async fn find_all<T>(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Document,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        track_db_operation("find", collection, async {
            let cursor = self
                .collection::<T>(collection)
                .find(filter)
                .sort(sort)
                .await?;
            let rows: Vec<T> = cursor.try_collect().await?;
            Ok::<_, StoreError>(rows)
        })
        .await
    }

    async fn find_by_id<T>(
        &self,
        collection: &'static str,
        id: i64,
    ) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        track_db_operation("find_one", collection, async {
            Ok::<_, StoreError>(
                self.collection::<T>(collection)
                    .find_one(doc! { "_id": id })
                    .await?,
            )
        })
        .await
    }

    /// Ids are sequential integers; the next one is the current maximum plus one.
    async fn next_id(&self, collection: &'static str) -> Result<i64, StoreError> {
        let last = self
            .collection::<Document>(collection)
            .find_one(doc! {})
            .sort(doc! { "_id": -1 })
            .projection(doc! { "_id": 1 })
            .await?;

        match last {
            None => Ok(1),
            Some(document) => document
                .get_i64("_id")
                .or_else(|_| document.get_i32("_id").map(i64::from))
                .map(|id| id + 1)
                .map_err(|err| {
                    StoreError::Decode(format!("non-integer _id in {}: {}", collection, err))
                }),
        }
    }

    async fn insert<T>(&self, collection: &'static str, record: &T) -> Result<(), StoreError>
    where
        T: Serialize + Send + Sync,
    {
        track_db_operation("insert_one", collection, async {
            self.collection::<T>(collection).insert_one(record).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }
}

#[async_trait]
impl CatalogStore for MongoLearningStore {
    async fn get_all_lessons(&self) -> Result<Vec<CatalogLesson>, StoreError> {
        let difficulties: HashMap<i64, i32> = self
            .list_courses()
            .await?
            .into_iter()
            .map(|course| (course.id, course.difficulty))
            .collect();

        self.list_lessons()
            .await?
            .iter()
            .map(|lesson| {
                let difficulty = difficulties.get(&lesson.course_id).ok_or_else(|| {
                    StoreError::Decode(format!(
                        "lesson {} references missing course {}",
                        lesson.id, lesson.course_id
                    ))
                })?;
                Ok(CatalogLesson::from_record(lesson, *difficulty))
            })
            .collect()
    }

    async fn get_question_totals(&self, lesson_id: i64) -> Result<QuestionTotals, StoreError> {
        let questions = self.list_questions(Some(lesson_id)).await?;
        Ok(QuestionTotals::from_questions(&questions))
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        self.find_all(COURSES, doc! {}, doc! { "_id": 1 }).await
    }

    async fn list_lessons(&self) -> Result<Vec<LessonRecord>, StoreError> {
        self.find_all(
            LESSONS,
            doc! {},
            doc! { "course_id": 1, "order_index": 1, "_id": 1 },
        )
        .await
    }

    async fn find_lesson(&self, lesson_id: i64) -> Result<Option<LessonRecord>, StoreError> {
        self.find_by_id(LESSONS, lesson_id).await
    }

    async fn list_questions(&self, lesson_id: Option<i64>) -> Result<Vec<Question>, StoreError> {
        let filter = match lesson_id {
            Some(id) => doc! { "lesson_id": id },
            None => doc! {},
        };
        self.find_all(
            QUESTIONS,
            filter,
            doc! { "lesson_id": 1, "order_index": 1, "_id": 1 },
        )
        .await
    }

    async fn find_question(&self, question_id: i64) -> Result<Option<Question>, StoreError> {
        self.find_by_id(QUESTIONS, question_id).await
    }
}

#[async_trait]
impl AttemptStore for MongoLearningStore {
    async fn find_student(&self, student_id: i64) -> Result<Option<Student>, StoreError> {
        self.find_by_id(STUDENTS, student_id).await
    }

    async fn student_exists(&self, student_id: i64) -> Result<bool, StoreError> {
        let count = track_db_operation("count", STUDENTS, async {
            Ok::<_, StoreError>(
                self.collection::<Document>(STUDENTS)
                    .count_documents(doc! { "_id": student_id })
                    .await?,
            )
        })
        .await?;
        Ok(count > 0)
    }

    async fn get_lesson_attempts(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Vec<LessonAttempt>, StoreError> {
        let documents: Vec<LessonAttemptDocument> = self
            .find_all(
                LESSON_ATTEMPTS,
                doc! { "student_id": student_id, "lesson_id": lesson_id },
                doc! { "timestamp": -1, "_id": -1 },
            )
            .await?;
        decode_all(documents)
    }

    async fn get_question_attempts(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Vec<QuestionAttempt>, StoreError> {
        let documents: Vec<QuestionAttemptDocument> = self
            .find_all(
                QUESTION_ATTEMPTS,
                doc! { "student_id": student_id, "lesson_id": lesson_id },
                doc! { "timestamp": -1, "_id": -1 },
            )
            .await?;
        decode_all(documents)
    }

    async fn list_student_lesson_attempts(
        &self,
        student_id: i64,
    ) -> Result<Vec<LessonAttempt>, StoreError> {
        let documents: Vec<LessonAttemptDocument> = self
            .find_all(
                LESSON_ATTEMPTS,
                doc! { "student_id": student_id },
                doc! { "timestamp": -1, "_id": -1 },
            )
            .await?;
        decode_all(documents)
    }

    async fn list_student_question_attempts(
        &self,
        student_id: i64,
    ) -> Result<Vec<QuestionAttempt>, StoreError> {
        let documents: Vec<QuestionAttemptDocument> = self
            .find_all(
                QUESTION_ATTEMPTS,
                doc! { "student_id": student_id },
                doc! { "timestamp": -1, "_id": -1 },
            )
            .await?;
        decode_all(documents)
    }

    async fn insert_lesson_attempt(
        &self,
        attempt: NewLessonAttempt,
    ) -> Result<LessonAttempt, StoreError> {
        let id = self.next_id(LESSON_ATTEMPTS).await?;
        let record = attempt.with_id(id);
        self.insert(LESSON_ATTEMPTS, &LessonAttemptDocument::from(&record))
            .await?;
        Ok(record)
    }

    async fn insert_question_attempt(
        &self,
        attempt: NewQuestionAttempt,
    ) -> Result<QuestionAttempt, StoreError> {
        let id = self.next_id(QUESTION_ATTEMPTS).await?;
        let record = attempt.with_id(id);
        self.insert(QUESTION_ATTEMPTS, &QuestionAttemptDocument::from(&record))
            .await?;
        Ok(record)
    }
}

#[async_trait]
impl LearningStore for MongoLearningStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.mongo.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
