use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::models::{
    attempt::LessonAttempt,
    catalog::{Course, LessonRecord},
    student::CourseOverview,
};
use crate::services::learning_store::{LearningStore, StoreError};

pub struct OverviewService {
    store: Arc<dyn LearningStore>,
}

impl OverviewService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    pub async fn student_overview(
        &self,
        student_id: i64,
    ) -> Result<Vec<CourseOverview>, StoreError> {
        let courses = self.store.list_courses().await?;
        let lessons = self.store.list_lessons().await?;
        let attempts = self.store.list_student_lesson_attempts(student_id).await?;

        Ok(summarize_courses(&courses, &lessons, &attempts))
    }
}

/// Progress per course, counted from lesson attempts only.
pub fn summarize_courses(
    courses: &[Course],
    lessons: &[LessonRecord],
    attempts: &[LessonAttempt],
) -> Vec<CourseOverview> {
    let lesson_course: HashMap<i64, i64> = lessons
        .iter()
        .map(|lesson| (lesson.id, lesson.course_id))
        .collect();
    let attempted: HashSet<i64> = attempts.iter().map(|attempt| attempt.lesson_id).collect();

    courses
        .iter()
        .map(|course| {
            let mut course_lessons: Vec<&LessonRecord> = lessons
                .iter()
                .filter(|lesson| lesson.course_id == course.id)
                .collect();
            course_lessons.sort_by_key(|lesson| (lesson.order_index, lesson.id));

            let course_attempts: Vec<&LessonAttempt> = attempts
                .iter()
                .filter(|attempt| lesson_course.get(&attempt.lesson_id) == Some(&course.id))
                .collect();

            let progress = course_attempts.len() as f64 / course_lessons.len().max(1) as f64;
            let last_activity = course_attempts.iter().map(|attempt| attempt.timestamp).max();
            let next_up = course_lessons
                .iter()
                .find(|lesson| !attempted.contains(&lesson.id))
                .map(|lesson| lesson.title.clone());

            CourseOverview {
                course_id: course.id,
                course_name: course.name.clone(),
                progress,
                last_activity,
                next_up,
            }
        })
        .collect()
}
