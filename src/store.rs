//! # Store
//!
//! In-memory catalogue of students, courses, lessons and the attempts log.
//!
//! - Seeded from a JSON file (`data/seed.json` by default) or the copy of that
//!   file compiled into the binary when no file is present.
//! - Seed integrity is checked up front: unique ids, unique emails, lessons point
//!   to existing courses, attempts point to existing students and lessons,
//!   correctness within `[0, 1]`.
//! - Thread-safe via `RwLock`; readers get owned snapshots.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::RwLock,
};

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::models::{Attempt, Course, CourseWithLessons, Lesson, LessonOut, NewAttempt, Student};

pub const DEFAULT_SEED_PATH: &str = "data/seed.json";

const BUILTIN_SEED: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/seed.json"));

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },
    #[error("duplicate student email")]
    DuplicateEmail,
    #[error("unknown {kind} {id}")]
    Unknown { kind: &'static str, id: u64 },
    #[error("correctness must be within [0, 1], got {0}")]
    InvalidCorrectness(f64),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Raw seed document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

impl Seed {
    /// The seed compiled into the binary.
    pub fn builtin() -> anyhow::Result<Self> {
        serde_json::from_str(BUILTIN_SEED).context("parsing built-in seed")
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading seed from {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parsing seed {}", path.display()))
    }

    /// Missing file → built-in seed.
    pub fn load_or_builtin(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!(target: "store", path = %path.display(), "seed file not found, using built-in seed");
            Self::builtin()
        }
    }
}

/// Everything the recommender needs about one student, copied out of the store.
#[derive(Debug, Clone)]
pub struct StudentView {
    pub student: Student,
    pub courses: Vec<Course>,
    /// All lessons, canonical order within each course.
    pub lessons: Vec<Lesson>,
    /// This student's attempts only.
    pub attempts: Vec<Attempt>,
}

#[derive(Debug)]
pub struct Store {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    students: HashMap<u64, Student>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    attempts: Vec<Attempt>,
    next_attempt_id: u64,
}

impl Store {
    pub fn from_seed(seed: Seed) -> Result<Self, StoreError> {
        let mut students = HashMap::with_capacity(seed.students.len());
        let mut emails = HashSet::new();
        for s in seed.students {
            if !emails.insert(s.email.trim().to_ascii_lowercase()) {
                return Err(StoreError::DuplicateEmail);
            }
            if students.contains_key(&s.id) {
                return Err(StoreError::DuplicateId {
                    kind: "student",
                    id: s.id,
                });
            }
            students.insert(s.id, s);
        }

        let mut course_ids = HashSet::new();
        for c in &seed.courses {
            if !course_ids.insert(c.id) {
                return Err(StoreError::DuplicateId {
                    kind: "course",
                    id: c.id,
                });
            }
        }

        let mut lesson_ids = HashSet::new();
        for l in &seed.lessons {
            if !lesson_ids.insert(l.id) {
                return Err(StoreError::DuplicateId {
                    kind: "lesson",
                    id: l.id,
                });
            }
            if !course_ids.contains(&l.course_id) {
                return Err(StoreError::Unknown {
                    kind: "course",
                    id: l.course_id,
                });
            }
        }

        let mut attempt_ids = HashSet::new();
        for a in &seed.attempts {
            if !attempt_ids.insert(a.id) {
                return Err(StoreError::DuplicateId {
                    kind: "attempt",
                    id: a.id,
                });
            }
            check_refs(&students, &lesson_ids, a.student_id, a.lesson_id)?;
            check_correctness(a.correctness)?;
        }

        let mut courses = seed.courses;
        courses.sort_by_key(|c| c.id);
        let mut lessons = seed.lessons;
        lessons.sort_by_key(|l| (l.course_id, l.order_index, l.id));
        let next_attempt_id = seed.attempts.iter().map(|a| a.id).max().unwrap_or(0) + 1;

        info!(
            target: "store",
            students = students.len(),
            courses = courses.len(),
            lessons = lessons.len(),
            attempts = seed.attempts.len(),
            "store seeded"
        );

        Ok(Self {
            inner: RwLock::new(Inner {
                students,
                courses,
                lessons,
                attempts: seed.attempts,
                next_attempt_id,
            }),
        })
    }

    #[cfg(test)]
    pub fn student(&self, id: u64) -> Result<Option<Student>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.students.get(&id).cloned())
    }

    /// Courses by id, each with its ordered lessons.
    pub fn courses(&self) -> Result<Vec<CourseWithLessons>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.courses.iter().map(|c| with_lessons(c, &g.lessons)).collect())
    }

    pub fn course(&self, id: u64) -> Result<Option<CourseWithLessons>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.courses
            .iter()
            .find(|c| c.id == id)
            .map(|c| with_lessons(c, &g.lessons)))
    }

    /// Ordered lessons of a course; `None` when the course does not exist.
    pub fn lessons_for(&self, course_id: u64) -> Result<Option<Vec<Lesson>>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        if !g.courses.iter().any(|c| c.id == course_id) {
            return Ok(None);
        }
        Ok(Some(
            g.lessons
                .iter()
                .filter(|l| l.course_id == course_id)
                .cloned()
                .collect(),
        ))
    }

    pub fn student_view(&self, student_id: u64) -> Result<Option<StudentView>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let Some(student) = g.students.get(&student_id).cloned() else {
            return Ok(None);
        };
        Ok(Some(StudentView {
            student,
            courses: g.courses.clone(),
            lessons: g.lessons.clone(),
            attempts: g
                .attempts
                .iter()
                .filter(|a| a.student_id == student_id)
                .cloned()
                .collect(),
        }))
    }

    /// Append to the attempts log; assigns the next id.
    pub fn add_attempt(&self, new: NewAttempt) -> Result<Attempt, StoreError> {
        check_correctness(new.correctness)?;
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let lesson_ids: HashSet<u64> = g.lessons.iter().map(|l| l.id).collect();
        check_refs(&g.students, &lesson_ids, new.student_id, new.lesson_id)?;

        let attempt = Attempt {
            id: g.next_attempt_id,
            student_id: new.student_id,
            lesson_id: new.lesson_id,
            timestamp: new.timestamp,
            correctness: new.correctness,
            hints_used: new.hints_used,
            duration_sec: new.duration_sec,
            code: new.code,
        };
        g.next_attempt_id += 1;
        g.attempts.push(attempt.clone());
        Ok(attempt)
    }

    #[cfg(test)]
    pub fn attempt_count(&self) -> Result<usize, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.attempts.len())
    }
}

fn with_lessons(course: &Course, lessons: &[Lesson]) -> CourseWithLessons {
    CourseWithLessons {
        course: course.clone(),
        lessons: lessons
            .iter()
            .filter(|l| l.course_id == course.id)
            .map(LessonOut::from)
            .collect(),
    }
}

fn check_refs(
    students: &HashMap<u64, Student>,
    lesson_ids: &HashSet<u64>,
    student_id: u64,
    lesson_id: u64,
) -> Result<(), StoreError> {
    if !students.contains_key(&student_id) {
        return Err(StoreError::Unknown {
            kind: "student",
            id: student_id,
        });
    }
    if !lesson_ids.contains(&lesson_id) {
        return Err(StoreError::Unknown {
            kind: "lesson",
            id: lesson_id,
        });
    }
    Ok(())
}

fn check_correctness(c: f64) -> Result<(), StoreError> {
    if c.is_finite() && (0.0..=1.0).contains(&c) {
        Ok(())
    } else {
        Err(StoreError::InvalidCorrectness(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn student(id: u64, email: &str) -> Student {
        Student {
            id,
            name: format!("S{id}"),
            email: email.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn small_seed() -> Seed {
        Seed {
            students: vec![student(1, "a@example.com")],
            courses: vec![Course {
                id: 10,
                name: "Test Course".into(),
                description: String::new(),
                difficulty: 1,
            }],
            lessons: vec![
                Lesson {
                    id: 101,
                    course_id: 10,
                    title: "First".into(),
                    tags: vec![],
                    order_index: 2,
                },
                Lesson {
                    id: 102,
                    course_id: 10,
                    title: "Second".into(),
                    tags: vec![],
                    order_index: 1,
                },
                Lesson {
                    id: 103,
                    course_id: 10,
                    title: "Third".into(),
                    tags: vec![],
                    order_index: 3,
                },
            ],
            attempts: vec![],
        }
    }

    fn new_attempt(student_id: u64, lesson_id: u64, correctness: f64) -> NewAttempt {
        NewAttempt {
            student_id,
            lesson_id,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            correctness,
            hints_used: 0,
            duration_sec: 0,
            code: None,
        }
    }

    #[test]
    fn builtin_seed_loads() {
        let store = Store::from_seed(Seed::builtin().unwrap()).unwrap();
        assert!(store.student(1).unwrap().is_some());
        assert_eq!(store.courses().unwrap().len(), 3);
    }

    #[test]
    fn lessons_listed_by_order_index() {
        let store = Store::from_seed(small_seed()).unwrap();
        let titles: Vec<String> = store
            .lessons_for(10)
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["Second", "First", "Third"]);
        assert!(store.lessons_for(99).unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let mut seed = small_seed();
        seed.students.push(student(2, "A@example.com"));
        assert_eq!(
            Store::from_seed(seed).unwrap_err(),
            StoreError::DuplicateEmail
        );
    }

    #[test]
    fn lesson_must_reference_course() {
        let mut seed = small_seed();
        seed.lessons[0].course_id = 77;
        assert!(matches!(
            Store::from_seed(seed),
            Err(StoreError::Unknown { kind: "course", id: 77 })
        ));
    }

    #[test]
    fn add_attempt_assigns_ids_and_validates() {
        let store = Store::from_seed(small_seed()).unwrap();
        let a1 = store.add_attempt(new_attempt(1, 101, 0.5)).unwrap();
        let a2 = store.add_attempt(new_attempt(1, 102, 1.0)).unwrap();
        assert_eq!(a1.id, 1);
        assert_eq!(a2.id, 2);
        assert_eq!(store.attempt_count().unwrap(), 2);

        assert!(matches!(
            store.add_attempt(new_attempt(9, 101, 0.5)),
            Err(StoreError::Unknown { kind: "student", .. })
        ));
        assert!(matches!(
            store.add_attempt(new_attempt(1, 999, 0.5)),
            Err(StoreError::Unknown { kind: "lesson", .. })
        ));
        assert!(matches!(
            store.add_attempt(new_attempt(1, 101, 1.2)),
            Err(StoreError::InvalidCorrectness(_))
        ));
    }

    #[test]
    fn student_view_filters_attempts() {
        let mut seed = small_seed();
        seed.students.push(student(2, "b@example.com"));
        let store = Store::from_seed(seed).unwrap();
        store.add_attempt(new_attempt(1, 101, 0.5)).unwrap();
        store.add_attempt(new_attempt(2, 101, 0.5)).unwrap();

        let view = store.student_view(2).unwrap().unwrap();
        assert_eq!(view.attempts.len(), 1);
        assert_eq!(view.attempts[0].student_id, 2);
        assert!(store.student_view(3).unwrap().is_none());
    }
}
