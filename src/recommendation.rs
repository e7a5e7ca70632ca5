//! recommendation.rs: from a student's view to the `/recommendation/` payload.
//!
//! Signals → ranker → best candidate plus runners-up, with reasons attached.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::explain::format_explanation;
use crate::recommender::{rank_candidates, FeatureVector, RankedCandidate, Weights};
use crate::signals::{build_candidates, SignalParams};
use crate::store::StudentView;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonRef {
    pub id: u64,
    pub title: String,
    pub course_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub id: u64,
    pub title: String,
    pub score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// `None` once every lesson is mastered.
    pub recommendation: Option<LessonRef>,
    pub score: Option<f64>,
    pub confidence: f64,
    pub reason_features: Option<FeatureVector>,
    pub alternatives: Vec<Alternative>,
    pub explanation: String,
    pub method: &'static str,
}

pub const METHOD: &str = "heuristic";

pub fn recommend(
    view: &StudentView,
    weights: &Weights,
    params: &SignalParams,
    alternatives: usize,
    now: DateTime<Utc>,
) -> Recommendation {
    let candidates = build_candidates(view, now, params);
    let ranked = rank_candidates(&candidates, weights);

    let Some((best, rest)) = ranked.split_first() else {
        return Recommendation {
            recommendation: None,
            score: None,
            confidence: 0.0,
            reason_features: None,
            alternatives: Vec::new(),
            explanation: "Every lesson is mastered. Nothing left to recommend.".to_string(),
            method: METHOD,
        };
    };

    let alts: Vec<Alternative> = rest
        .iter()
        .take(alternatives)
        .map(|r| Alternative {
            id: r.lesson_id,
            title: lesson_title(view, r),
            score: r.score,
            confidence: r.confidence,
        })
        .collect();

    let lesson = view.lessons.iter().find(|l| l.id == best.lesson_id);
    let course_id = lesson.map(|l| l.course_id).unwrap_or_default();
    let course_name = view
        .courses
        .iter()
        .find(|c| c.id == course_id)
        .map(|c| c.name.as_str())
        .unwrap_or("Course");
    let title = lesson_title(view, best);

    let alt_lines: Vec<(String, f64)> =
        alts.iter().map(|a| (a.title.clone(), a.confidence)).collect();
    let explanation =
        format_explanation(&title, course_name, best.confidence, &best.features, &alt_lines);

    Recommendation {
        recommendation: Some(LessonRef {
            id: best.lesson_id,
            title,
            course_id,
        }),
        score: Some(best.score),
        confidence: best.confidence,
        reason_features: Some(best.features),
        alternatives: alts,
        explanation,
        method: METHOD,
    }
}

fn lesson_title(view: &StudentView, r: &RankedCandidate) -> String {
    view.lessons
        .iter()
        .find(|l| l.id == r.lesson_id)
        .map(|l| l.title.clone())
        .unwrap_or_else(|| format!("Lesson {}", r.lesson_id))
}
