//! `for-loop-off-by-one`: `i <= xs.length` in a `for` header.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Issue, Severity, Source};

static FOR_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfor\s*\(").expect("for header regex"));

static LE_LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z_$][\w$]*\s*<=\s*[A-Za-z_$][\w$.]*\.length\b").expect("condition regex")
});

pub(super) fn check(src: &Source<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();
    for m in FOR_HEAD.find_iter(&src.code) {
        let open = m.end() - 1;
        let Some(&close) = src.parens.get(&open) else {
            continue;
        };
        let header = &src.code[open + 1..close];
        // Only the condition clause of a classic three-part header.
        let Some(first) = header.find(';') else {
            continue;
        };
        let rest = &header[first + 1..];
        let Some(second) = rest.find(';') else {
            continue;
        };
        let cond = &rest[..second];
        if let Some(hit) = LE_LENGTH.find(cond) {
            let offset = open + 1 + first + 1 + hit.start();
            issues.push(Issue {
                rule: "for-loop-off-by-one",
                message: "Loop condition uses `<=` against `.length`; the last iteration reads past the end."
                    .to_string(),
                severity: Severity::Warn,
                fix_hint: Some("Use `<` instead of `<=` when comparing with `.length`.".to_string()),
                location: Some(src.location(offset)),
            });
        }
    }
    issues
}
