use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseOverview {
    pub course_id: i64,
    pub course_name: String,
    pub progress: f64,
    pub last_activity: Option<DateTime<Utc>>,
    pub next_up: Option<String>,
}
