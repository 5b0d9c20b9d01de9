use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{catalog_order, AttemptStore, CatalogStore, LearningStore, StoreError};
use crate::models::{
    attempt::{LessonAttempt, NewLessonAttempt, NewQuestionAttempt, QuestionAttempt},
    catalog::{CatalogLesson, Course, LessonRecord, Question, QuestionTotals},
    student::Student,
};

#[derive(Default)]
struct Tables {
    students: BTreeMap<i64, Student>,
    courses: BTreeMap<i64, Course>,
    lessons: BTreeMap<i64, LessonRecord>,
    questions: BTreeMap<i64, Question>,
    lesson_attempts: Vec<LessonAttempt>,
    question_attempts: Vec<QuestionAttempt>,
}

/// Process-local store used by tests and local experiments.
#[derive(Default)]
pub struct InMemoryLearningStore {
    tables: RwLock<Tables>,
}

impl InMemoryLearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_student(&self, student: Student) {
        let mut tables = self.tables.write().await;
        tables.students.insert(student.id, student);
    }

    pub async fn insert_course(&self, course: Course) {
        let mut tables = self.tables.write().await;
        tables.courses.insert(course.id, course);
    }

    pub async fn insert_lesson(&self, lesson: LessonRecord) {
        let mut tables = self.tables.write().await;
        tables.lessons.insert(lesson.id, lesson);
    }

    pub async fn insert_question(&self, question: Question) {
        let mut tables = self.tables.write().await;
        tables.questions.insert(question.id, question);
    }

    /// Stores an attempt with its id as given, for fixtures.
    pub async fn insert_lesson_attempt_record(&self, attempt: LessonAttempt) {
        let mut tables = self.tables.write().await;
        tables.lesson_attempts.push(attempt);
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl CatalogStore for InMemoryLearningStore {
    async fn get_all_lessons(&self) -> Result<Vec<CatalogLesson>, StoreError> {
        let tables = self.tables.read().await;
        let mut lessons = tables
            .lessons
            .values()
            .map(|lesson| {
                let course = tables.courses.get(&lesson.course_id).ok_or_else(|| {
                    StoreError::Decode(format!(
                        "lesson {} references missing course {}",
                        lesson.id, lesson.course_id
                    ))
                })?;
                Ok(CatalogLesson::from_record(lesson, course.difficulty))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        lessons.sort_by_key(catalog_order);
        Ok(lessons)
    }

    async fn get_question_totals(&self, lesson_id: i64) -> Result<QuestionTotals, StoreError> {
        let tables = self.tables.read().await;
        Ok(QuestionTotals::from_questions(
            tables
                .questions
                .values()
                .filter(|question| question.lesson_id == lesson_id),
        ))
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.courses.values().cloned().collect())
    }

    async fn list_lessons(&self) -> Result<Vec<LessonRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<LessonRecord> = tables.lessons.values().cloned().collect();
        lessons.sort_by_key(|lesson| (lesson.course_id, lesson.order_index, lesson.id));
        Ok(lessons)
    }

    async fn find_lesson(&self, lesson_id: i64) -> Result<Option<LessonRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lessons.get(&lesson_id).cloned())
    }

    async fn list_questions(&self, lesson_id: Option<i64>) -> Result<Vec<Question>, StoreError> {
        let tables = self.tables.read().await;
        let mut questions: Vec<Question> = tables
            .questions
            .values()
            .filter(|question| lesson_id.map_or(true, |id| question.lesson_id == id))
            .cloned()
            .collect();
        questions.sort_by_key(|question| (question.lesson_id, question.order_index, question.id));
        Ok(questions)
    }

    async fn find_question(&self, question_id: i64) -> Result<Option<Question>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.questions.get(&question_id).cloned())
    }
}

#[async_trait]
impl AttemptStore for InMemoryLearningStore {
    async fn find_student(&self, student_id: i64) -> Result<Option<Student>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.students.get(&student_id).cloned())
    }

    async fn get_lesson_attempts(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Vec<LessonAttempt>, StoreError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<LessonAttempt> = tables
            .lesson_attempts
            .iter()
            .filter(|attempt| attempt.student_id == student_id && attempt.lesson_id == lesson_id)
            .cloned()
            .collect();
        newest_first(&mut attempts, |attempt| (attempt.timestamp, attempt.id));
        Ok(attempts)
    }

    async fn get_question_attempts(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Vec<QuestionAttempt>, StoreError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<QuestionAttempt> = tables
            .question_attempts
            .iter()
            .filter(|attempt| attempt.student_id == student_id && attempt.lesson_id == lesson_id)
            .cloned()
            .collect();
        newest_first(&mut attempts, |attempt| (attempt.timestamp, attempt.id));
        Ok(attempts)
    }

    async fn list_student_lesson_attempts(
        &self,
        student_id: i64,
    ) -> Result<Vec<LessonAttempt>, StoreError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<LessonAttempt> = tables
            .lesson_attempts
            .iter()
            .filter(|attempt| attempt.student_id == student_id)
            .cloned()
            .collect();
        newest_first(&mut attempts, |attempt| (attempt.timestamp, attempt.id));
        Ok(attempts)
    }

    async fn list_student_question_attempts(
        &self,
        student_id: i64,
    ) -> Result<Vec<QuestionAttempt>, StoreError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<QuestionAttempt> = tables
            .question_attempts
            .iter()
            .filter(|attempt| attempt.student_id == student_id)
            .cloned()
            .collect();
        newest_first(&mut attempts, |attempt| (attempt.timestamp, attempt.id));
        Ok(attempts)
    }

    async fn insert_lesson_attempt(
        &self,
        attempt: NewLessonAttempt,
    ) -> Result<LessonAttempt, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables
            .lesson_attempts
            .iter()
            .map(|attempt| attempt.id)
            .max()
            .unwrap_or(0)
            + 1;
        let record = attempt.with_id(id);
        tables.lesson_attempts.push(record.clone());
        Ok(record)
    }

    async fn insert_question_attempt(
        &self,
        attempt: NewQuestionAttempt,
    ) -> Result<QuestionAttempt, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables
            .question_attempts
            .iter()
            .map(|attempt| attempt.id)
            .max()
            .unwrap_or(0)
            + 1;
        let record = attempt.with_id(id);
        tables.question_attempts.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl LearningStore for InMemoryLearningStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
