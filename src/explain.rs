//! Human-readable explanation of a recommendation.

use crate::recommender::FeatureVector;

/// One line per feature, in feature order.
pub fn reasons(f: &FeatureVector) -> Vec<String> {
    let mut out = Vec::with_capacity(FeatureVector::LEN);
    out.push(format!("{:.0}% of this lesson still to go", f.progress_inverse));
    out.push(if f.recency_gap_days < 1.0 {
        "practised within the last day".to_string()
    } else {
        format!("last practised {:.1} days ago", f.recency_gap_days)
    });
    out.push(if f.tag_gap > 0.0 {
        format!("{:.0}% of its topics not yet mastered", f.tag_gap * 100.0)
    } else {
        "all of its topics already covered".to_string()
    });
    if f.hint_rate > 0.0 {
        out.push(format!(
            "hints used in {:.0}% of attempts in this course",
            f.hint_rate * 100.0
        ));
    } else {
        out.push("no hints needed in this course so far".to_string());
    }
    out
}

/// Multi-line summary: headline, reasons, then runners-up.
pub fn format_explanation(
    title: &str,
    course: &str,
    confidence: f64,
    features: &FeatureVector,
    alternatives: &[(String, f64)],
) -> String {
    let mut s = format!(
        "Next up: \"{title}\" ({course}), confidence {:.0}%.",
        confidence * 100.0
    );
    for r in reasons(features) {
        s.push_str("\n- ");
        s.push_str(&r);
    }
    if !alternatives.is_empty() {
        s.push_str("\nAlso worth a look:");
        for (t, c) in alternatives {
            s.push_str(&format!("\n- \"{t}\" ({:.0}%)", c * 100.0));
        }
    }
    s
}
