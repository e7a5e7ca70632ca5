//! `duplicate-blocks`: `{...}` blocks whose normalized content repeats.
//!
//! Content is compared whitespace-collapsed; blocks of 10 chars or fewer are
//! ignored. Near duplicates (`normalized_levenshtein >= 0.95`) join the group of
//! the block they resemble. Each group is reported once, at its second member.
//!
//! Exact repeats are found at any size. The Levenshtein pass is quadratic, so it
//! only runs on blocks up to `MAX_NEAR_DUPLICATE_CHARS`, only between bodies
//! whose lengths could still reach the threshold, and within a per-snippet
//! budget of `NEAR_DUPLICATE_BUDGET` compared char pairs.

use std::collections::HashMap;

use strsim::normalized_levenshtein;

use super::{Issue, Severity, Source};

const MIN_BLOCK_CHARS: usize = 10;
const NEAR_DUPLICATE_SIMILARITY: f64 = 0.95;
const MAX_NEAR_DUPLICATE_CHARS: usize = 2_000;
const NEAR_DUPLICATE_BUDGET: usize = 4_000_000;

struct Group {
    rep: String,
    chars: usize,
    members: usize,
}

pub(super) fn check(src: &Source<'_>) -> Vec<Issue> {
    let mut groups: Vec<Group> = Vec::new();
    let mut exact: HashMap<String, usize> = HashMap::new();
    let mut budget = NEAR_DUPLICATE_BUDGET;
    let mut issues = Vec::new();

    for (open, close) in src.blocks() {
        let body = normalize(&src.original[open + 1..close]);
        let chars = body.chars().count();
        if chars <= MIN_BLOCK_CHARS {
            continue;
        }

        let group = match exact.get(&body) {
            Some(&g) => Some(g),
            None => near_duplicate(&groups, &body, chars, &mut budget),
        };

        match group {
            Some(g) => {
                groups[g].members += 1;
                if groups[g].members == 2 {
                    issues.push(Issue {
                        rule: "duplicate-blocks",
                        message: "Duplicate code blocks detected.".to_string(),
                        severity: Severity::Warn,
                        fix_hint: Some(
                            "Refactor duplicate code into a reusable function or consolidate logic."
                                .to_string(),
                        ),
                        location: Some(src.location(open)),
                    });
                }
                exact.entry(body).or_insert(g);
            }
            None => {
                exact.insert(body.clone(), groups.len());
                groups.push(Group {
                    rep: body,
                    chars,
                    members: 1,
                });
            }
        }
    }
    issues
}

/// First group `body` nearly repeats. Spends `budget` on every comparison made.
fn near_duplicate(groups: &[Group], body: &str, chars: usize, budget: &mut usize) -> Option<usize> {
    if chars > MAX_NEAR_DUPLICATE_CHARS {
        return None;
    }
    groups.iter().position(|g| {
        let (lo, hi) = (g.chars.min(chars), g.chars.max(chars));
        // Edit distance is at least the length difference.
        if hi > MAX_NEAR_DUPLICATE_CHARS || (lo as f64) < NEAR_DUPLICATE_SIMILARITY * hi as f64 {
            return false;
        }
        let cost = lo * hi;
        if cost > *budget {
            return false;
        }
        *budget -= cost;
        normalized_levenshtein(&g.rep, body) >= NEAR_DUPLICATE_SIMILARITY
    })
}

fn normalize(block: &str) -> String {
    block.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn run(code: &str) -> Vec<Issue> {
        check(&Source::prepare(code).unwrap())
    }

    #[test]
    fn identical_blocks_reported_once() {
        let code = "if (a) {\n  total += price * qty;\n}\nif (b) {\n  total += price * qty;\n}\nif (c) { total += price * qty; }";
        let issues = run(code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location.unwrap().line, 4);
    }

    #[test]
    fn short_blocks_ignored() {
        assert!(run("if (a) { f(); }\nif (b) { f(); }").is_empty());
    }

    #[test]
    fn distinct_blocks_are_fine() {
        assert!(run("if (a) { saveUser(user); }\nif (b) { deleteAccount(id, force); }").is_empty());
    }

    #[test]
    fn large_blocks_stay_fast() {
        let body = "x = x + 1; ".repeat(2_000);
        let mut other = body.clone();
        other.push_str("y = 2;");
        let code = format!("if (a) {{ {body} }}\nif (b) {{ {other} }}\nif (c) {{ {body} }}");

        let started = Instant::now();
        let issues = run(&code);
        assert!(started.elapsed() < Duration::from_secs(1), "{:?}", started.elapsed());
        // Too long for the near-duplicate pass; the exact repeat is still found.
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location.unwrap().line, 3);
    }

    #[test]
    fn many_small_blocks_stay_fast() {
        let code: String = (0..2_000)
            .map(|i| format!("if (a) {{ call({i:05}); }}\n"))
            .collect();
        let started = Instant::now();
        let issues = run(&code);
        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
        assert!(issues.is_empty());
    }

    #[test]
    fn near_duplicates_count() {
        let code = "if (a) { console.log('processing order total'); }\nif (b) { console.log('processing order totals'); }";
        assert_eq!(run(code).len(), 1);
    }
}
