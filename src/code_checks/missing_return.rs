//! `missing-return`: function bodies without any `return` statement.
//!
//! Covers `function` declarations and expressions plus block-bodied arrow
//! functions. A `return` anywhere in the body counts, nested functions included.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Issue, Severity, Source};

static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfunction\b\s*\*?\s*([A-Za-z_$][\w$]*)?\s*\(").expect("function regex")
});

static ARROW_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"=>\s*\{").expect("arrow regex"));

static RETURN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\breturn\b").expect("return regex"));

pub(super) fn check(src: &Source<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();

    for caps in FUNCTION.captures_iter(&src.code) {
        let Some(whole) = caps.get(0) else { continue };
        let params_open = whole.end() - 1;
        let Some(body_open) = body_after_params(src, params_open) else {
            continue;
        };
        if has_return(src, body_open) {
            continue;
        }
        let message = match caps.get(1) {
            Some(name) => format!("Function '{}' should have a return statement", name.as_str()),
            None => "Function expression should have a return statement".to_string(),
        };
        issues.push(Issue {
            rule: "missing-return",
            message,
            severity: Severity::Warn,
            fix_hint: Some("Add a return statement to the function body".to_string()),
            location: Some(src.location(whole.start())),
        });
    }

    for m in ARROW_BLOCK.find_iter(&src.code) {
        let body_open = m.end() - 1;
        if has_return(src, body_open) {
            continue;
        }
        issues.push(Issue {
            rule: "missing-return",
            message: "Arrow function should have a return statement".to_string(),
            severity: Severity::Warn,
            fix_hint: Some(
                "Add a return statement to the function body or use implicit return".to_string(),
            ),
            location: Some(src.location(m.start())),
        });
    }

    issues.sort_by_key(|i| i.location.map(|l| (l.line, l.column)));
    issues
}

/// Offset of the `{` opening the body that follows a parameter list, skipping
/// an optional TypeScript return annotation.
fn body_after_params(src: &Source<'_>, params_open: usize) -> Option<usize> {
    let params_close = *src.parens.get(&params_open)?;
    let tail = &src.code[params_close + 1..];
    let trimmed = tail.trim_start();
    let skipped = tail.len() - trimmed.len();
    let rel = if trimmed.starts_with('{') {
        0
    } else if trimmed.starts_with(':') {
        trimmed.find('{')?
    } else {
        return None;
    };
    let open = params_close + 1 + skipped + rel;
    src.braces.contains_key(&open).then_some(open)
}

fn has_return(src: &Source<'_>, body_open: usize) -> bool {
    match src.braces.get(&body_open) {
        Some(&close) => RETURN.is_match(&src.code[body_open..close]),
        None => true,
    }
}
