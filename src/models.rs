//! models.rs: students, courses, lessons and the attempts log.
//!
//! These are the records the store keeps and the API serializes. Defaults mirror
//! what a freshly created row gets (empty description, difficulty 1, no tags,
//! order 0, no hints).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
    /// Unique across students. Never logged in clear.
    pub email: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
}

fn default_difficulty() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: u64,
    pub course_id: u64,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub order_index: u32,
}

impl Lesson {
    /// Canonical lesson order within a course.
    pub fn order_key(&self) -> (u32, u64) {
        (self.order_index, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: u64,
    pub student_id: u64,
    pub lesson_id: u64,
    pub timestamp: DateTime<Utc>,
    /// Fraction correct, 0.0..=1.0.
    pub correctness: f64,
    #[serde(default)]
    pub hints_used: u32,
    #[serde(default)]
    pub duration_sec: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Attempt fields supplied by a caller; the store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub student_id: u64,
    pub lesson_id: u64,
    pub timestamp: DateTime<Utc>,
    pub correctness: f64,
    pub hints_used: u32,
    pub duration_sec: u32,
    pub code: Option<String>,
}

/// Course with its lessons in canonical order, as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseWithLessons {
    #[serde(flatten)]
    pub course: Course,
    pub lessons: Vec<LessonOut>,
}

/// Lesson shape nested under a course (no redundant `course_id`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonOut {
    pub id: u64,
    pub title: String,
    pub tags: Vec<String>,
    pub order_index: u32,
}

impl From<&Lesson> for LessonOut {
    fn from(l: &Lesson) -> Self {
        Self {
            id: l.id,
            title: l.title.clone(),
            tags: l.tags.clone(),
            order_index: l.order_index,
        }
    }
}
