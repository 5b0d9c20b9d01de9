use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use mongodb::{
    bson::{doc, to_document, Document},
    Database,
};
use serde::Serialize;

use crate::models::{
    attempt::LessonAttempt,
    catalog::{Course, LessonRecord, Question, QuestionType},
    student::Student,
};
use crate::services::learning_store::{
    mongo::{LessonAttemptDocument, COURSES, LESSONS, LESSON_ATTEMPTS, QUESTIONS, STUDENTS},
    AttemptStore, InMemoryLearningStore, StoreError,
};

pub const DEMO_STUDENT_EMAIL: &str = "demo@student.com";

/// Small catalog plus one attempt, enough to get a non-trivial recommendation.
#[derive(Debug, Clone)]
pub struct DemoDataset {
    pub student: Student,
    pub course: Course,
    pub lessons: Vec<LessonRecord>,
    pub questions: Vec<Question>,
    pub attempts: Vec<LessonAttempt>,
}

pub fn demo_dataset(now: DateTime<Utc>) -> DemoDataset {
    let student = Student {
        id: 1,
        name: "Demo Student".to_string(),
        email: DEMO_STUDENT_EMAIL.to_string(),
        created_at: now,
    };

    let course = Course {
        id: 1,
        name: "Python 101".to_string(),
        description: "Learn Python basics".to_string(),
        difficulty: 2,
    };

    let lessons = vec![
        LessonRecord {
            id: 1,
            course_id: course.id,
            title: "Intro".to_string(),
            tags: vec!["python".to_string()],
            order_index: 1,
        },
        LessonRecord {
            id: 2,
            course_id: course.id,
            title: "Loops".to_string(),
            tags: vec!["python".to_string(), "loops".to_string()],
            order_index: 2,
        },
    ];

    let questions = vec![
        Question {
            id: 1,
            lesson_id: 1,
            question_type: QuestionType::Mcq,
            title: "Printing".to_string(),
            content: "Which function writes text to stdout?".to_string(),
            options: Some(vec![
                "print".to_string(),
                "echo".to_string(),
                "puts".to_string(),
            ]),
            correct_answer: serde_json::json!("print"),
            difficulty: 1,
            points: 10,
            order_index: 1,
            tags: vec!["python".to_string()],
        },
        Question {
            id: 2,
            lesson_id: 2,
            question_type: QuestionType::Text,
            title: "Range".to_string(),
            content: "What does list(range(3)) evaluate to?".to_string(),
            options: None,
            correct_answer: serde_json::json!("[0, 1, 2]"),
            difficulty: 2,
            points: 10,
            order_index: 1,
            tags: vec!["python".to_string(), "loops".to_string()],
        },
    ];

    let attempts = vec![LessonAttempt {
        id: 1,
        student_id: student.id,
        lesson_id: 1,
        timestamp: now - Duration::days(1),
        correctness: 0.8,
        hints_used: 1,
        duration_sec: 300,
    }];

    DemoDataset {
        student,
        course,
        lessons,
        questions,
        attempts,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted,
    AlreadyPresent,
}

pub async fn seed_mongo(mongo: &Database, now: DateTime<Utc>) -> Result<SeedOutcome> {
    let students = mongo.collection::<Document>(STUDENTS);
    let existing = students
        .find_one(doc! { "email": DEMO_STUDENT_EMAIL })
        .await
        .context("Failed to look up demo student")?;
    if existing.is_some() {
        tracing::info!("Demo student already exists, seed skipped");
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let data = demo_dataset(now);
    tracing::info!(
        "Seeding demo data: {} lessons, {} questions, {} attempts",
        data.lessons.len(),
        data.questions.len(),
        data.attempts.len()
    );

    upsert(mongo, STUDENTS, &data.student).await?;
    upsert(mongo, COURSES, &data.course).await?;
    for lesson in &data.lessons {
        upsert(mongo, LESSONS, lesson).await?;
    }
    for question in &data.questions {
        upsert(mongo, QUESTIONS, question).await?;
    }
    for attempt in &data.attempts {
        upsert(mongo, LESSON_ATTEMPTS, &LessonAttemptDocument::from(attempt)).await?;
    }

    tracing::info!("Demo data inserted");
    Ok(SeedOutcome::Inserted)
}

async fn upsert<T: Serialize>(mongo: &Database, collection: &str, row: &T) -> Result<()> {
    let document =
        to_document(row).with_context(|| format!("Failed to encode {collection} row"))?;
    let id = document
        .get("_id")
        .cloned()
        .with_context(|| format!("{collection} row has no _id"))?;

    mongo
        .collection::<Document>(collection)
        .update_one(doc! { "_id": id }, doc! { "$setOnInsert": document })
        .upsert(true)
        .await
        .with_context(|| format!("Failed to upsert into {collection}"))?;
    Ok(())
}

/// Loads the demo dataset into a process-local store, skipping if the student is present.
pub async fn seed_in_memory(
    store: &InMemoryLearningStore,
    now: DateTime<Utc>,
) -> Result<SeedOutcome, StoreError> {
    let data = demo_dataset(now);
    if store.student_exists(data.student.id).await? {
        return Ok(SeedOutcome::AlreadyPresent);
    }

    store.insert_student(data.student).await;
    store.insert_course(data.course).await;
    for lesson in data.lessons {
        store.insert_lesson(lesson).await;
    }
    for question in data.questions {
        store.insert_question(question).await;
    }
    for attempt in data.attempts {
        store.insert_lesson_attempt_record(attempt).await;
    }
    Ok(SeedOutcome::Inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::learning_store::CatalogStore;

    #[test]
    fn test_demo_dataset_shape() {
        let now = Utc::now();
        let data = demo_dataset(now);

        assert_eq!(data.student.email, DEMO_STUDENT_EMAIL);
        assert_eq!(data.course.difficulty, 2);
        let titles: Vec<&str> = data.lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Loops"]);
        assert_eq!(data.lessons[1].tags, vec!["python", "loops"]);
        assert_eq!(data.questions.len(), 2);
        assert!(data
            .lessons
            .iter()
            .all(|lesson| data.questions.iter().any(|q| q.lesson_id == lesson.id)));

        let attempt = &data.attempts[0];
        assert_eq!(attempt.lesson_id, 1);
        assert_eq!(attempt.correctness, 0.8);
        assert_eq!(attempt.hints_used, 1);
        assert_eq!(attempt.duration_sec, 300);
        assert!(attempt.timestamp < now);
    }

    #[tokio::test]
    async fn test_seed_in_memory_is_idempotent() {
        let store = InMemoryLearningStore::new();
        let now = Utc::now();

        assert_eq!(
            seed_in_memory(&store, now).await.unwrap(),
            SeedOutcome::Inserted
        );
        assert_eq!(
            seed_in_memory(&store, now).await.unwrap(),
            SeedOutcome::AlreadyPresent
        );

        assert_eq!(store.get_all_lessons().await.unwrap().len(), 2);
        assert_eq!(store.get_lesson_attempts(1, 1).await.unwrap().len(), 1);
    }
}
