//! `unused-vars`: `let`/`const`/`var` bindings never referenced again.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{is_ident_byte, Issue, Severity, Source};

static DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:let|const|var)\s+([A-Za-z_$][\w$]*)").expect("declaration regex")
});

pub(super) fn check(src: &Source<'_>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for caps in DECL.captures_iter(&src.code) {
        let Some(name) = caps.get(1) else { continue };
        if !seen.insert(name.as_str()) {
            continue;
        }
        let used = occurrences(&src.code, name.as_str()).any(|at| at != name.start());
        if !used {
            issues.push(Issue {
                rule: "unused-vars",
                message: format!("Variable \"{}\" is declared but never used.", name.as_str()),
                severity: Severity::Warn,
                fix_hint: Some(format!("Remove \"{}\" or use it.", name.as_str())),
                location: Some(src.location(name.start())),
            });
        }
    }
    issues
}

/// Offsets where `name` appears as a whole identifier (property accesses like
/// `obj.name` excluded).
fn occurrences<'a>(code: &'a str, name: &'a str) -> impl Iterator<Item = usize> + 'a {
    let bytes = code.as_bytes();
    code.match_indices(name).filter_map(move |(at, _)| {
        let end = at + name.len();
        let before_ok = at == 0 || !(is_ident_byte(bytes[at - 1]) || bytes[at - 1] == b'.');
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        (before_ok && after_ok).then_some(at)
    })
}
