//! Candidate signals derived from the attempts log.
//!
//! Turns a [`StudentView`] into the four per-lesson signals the recommender
//! scores, and into the per-course progress rows of the overview endpoint.
//! The reference time is always passed in; nothing here reads the clock.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Attempt, Lesson};
use crate::recommender::{Candidate, CandidateSignals};
use crate::store::StudentView;

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParams {
    /// Best correctness at or above this marks a lesson as mastered.
    pub mastery_threshold: f64,
    /// Recency gap used when the student never touched the lesson's course.
    pub unseen_recency_days: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            mastery_threshold: 0.8,
            unseen_recency_days: 30.0,
        }
    }
}

/// One row of the student overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgress {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub difficulty: u8,
    /// Mastered lessons / lessons, in percent.
    pub progress: f64,
    pub last_activity: Option<DateTime<Utc>>,
    pub next_up: Option<String>,
}

/// Precomputed lookups over one student's attempts.
struct Index<'a> {
    lessons: HashMap<u64, &'a Lesson>,
    best: HashMap<u64, f64>,
    mastered: HashSet<u64>,
}

impl<'a> Index<'a> {
    fn new(view: &'a StudentView, params: &SignalParams) -> Self {
        let lessons: HashMap<u64, &Lesson> = view.lessons.iter().map(|l| (l.id, l)).collect();
        let mut best: HashMap<u64, f64> = HashMap::new();
        for a in &view.attempts {
            best.entry(a.lesson_id)
                .and_modify(|b| *b = b.max(a.correctness))
                .or_insert(a.correctness);
        }
        let mastered = best
            .iter()
            .filter(|(_, &c)| c >= params.mastery_threshold)
            .map(|(&id, _)| id)
            .collect();
        Self {
            lessons,
            best,
            mastered,
        }
    }

    fn course_of(&self, a: &Attempt) -> Option<u64> {
        self.lessons.get(&a.lesson_id).map(|l| l.course_id)
    }

    fn mastered_tags(&self) -> HashSet<&'a str> {
        self.mastered
            .iter()
            .filter_map(|id| self.lessons.get(id).copied())
            .flat_map(|l| l.tags.iter().map(String::as_str))
            .collect()
    }
}

/// Signals for one lesson at reference time `now`.
pub fn lesson_signals(
    view: &StudentView,
    lesson: &Lesson,
    now: DateTime<Utc>,
    params: &SignalParams,
) -> CandidateSignals {
    let idx = Index::new(view, params);
    signals_with_index(view, &idx, lesson, now, params)
}

fn signals_with_index(
    view: &StudentView,
    idx: &Index<'_>,
    lesson: &Lesson,
    now: DateTime<Utc>,
    params: &SignalParams,
) -> CandidateSignals {
    let progress = idx.best.get(&lesson.id).copied().unwrap_or(0.0) * 100.0;

    let course_attempts: Vec<&Attempt> = view
        .attempts
        .iter()
        .filter(|a| idx.course_of(a) == Some(lesson.course_id))
        .collect();

    let last_on_lesson = course_attempts
        .iter()
        .filter(|a| a.lesson_id == lesson.id)
        .map(|a| a.timestamp)
        .max();
    let last_in_course = course_attempts.iter().map(|a| a.timestamp).max();
    let recency_gap_days = match last_on_lesson.or(last_in_course) {
        Some(ts) => days_between(ts, now),
        None => params.unseen_recency_days,
    };

    let tag_gap = tag_gap_for(lesson, &idx.mastered_tags());

    let hint_rate = if course_attempts.is_empty() {
        0.0
    } else {
        let hinted = course_attempts.iter().filter(|a| a.hints_used > 0).count();
        hinted as f64 / course_attempts.len() as f64
    };

    CandidateSignals {
        progress,
        recency_gap_days,
        tag_gap,
        hint_rate,
    }
}

/// Every non-mastered lesson, with its signals.
pub fn build_candidates(
    view: &StudentView,
    now: DateTime<Utc>,
    params: &SignalParams,
) -> Vec<Candidate> {
    let idx = Index::new(view, params);
    view.lessons
        .iter()
        .filter(|l| !idx.mastered.contains(&l.id))
        .map(|l| Candidate {
            lesson_id: l.id,
            order_index: l.order_index,
            signals: signals_with_index(view, &idx, l, now, params),
        })
        .collect()
}

/// Per-course progress rows in course id order.
pub fn course_overview(view: &StudentView, params: &SignalParams) -> Vec<CourseProgress> {
    let idx = Index::new(view, params);
    view.courses
        .iter()
        .map(|c| {
            let lessons: Vec<&Lesson> = {
                let mut v: Vec<&Lesson> =
                    view.lessons.iter().filter(|l| l.course_id == c.id).collect();
                v.sort_by_key(|l| l.order_key());
                v
            };
            let done = lessons.iter().filter(|l| idx.mastered.contains(&l.id)).count();
            let progress = if lessons.is_empty() {
                0.0
            } else {
                done as f64 / lessons.len() as f64 * 100.0
            };
            let last_activity = view
                .attempts
                .iter()
                .filter(|a| idx.course_of(a) == Some(c.id))
                .map(|a| a.timestamp)
                .max();
            let next_up = lessons
                .iter()
                .find(|l| !idx.mastered.contains(&l.id))
                .map(|l| l.title.clone());
            CourseProgress {
                id: c.id,
                name: c.name.clone(),
                description: c.description.clone(),
                difficulty: c.difficulty,
                progress,
                last_activity,
                next_up,
            }
        })
        .collect()
}

fn tag_gap_for(lesson: &Lesson, mastered_tags: &HashSet<&str>) -> f64 {
    let tags: HashSet<&str> = lesson.tags.iter().map(String::as_str).collect();
    if tags.is_empty() {
        return 0.0;
    }
    let missing = tags.iter().filter(|t| !mastered_tags.contains(*t)).count();
    missing as f64 / tags.len() as f64
}

/// Fractional days from `from` to `to`, floored at zero.
fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / MS_PER_DAY).max(0.0)
}
