// src/code_checks/mod.rs
//! Lightweight static checks for submitted JavaScript/TypeScript snippets.
//!
//! No real parser: the snippet is scanned once to blank out strings, comments
//! and regex literals (byte offsets preserved), braces/parens are matched, and
//! each rule works on that prepared [`Source`]. Code inside template `${...}`
//! interpolations stays visible to the rules. Good enough for practice-sized
//! code, capped at [`MAX_SNIPPET_BYTES`].
//!
//! Known limitations:
//! - Regex vs division is decided by the previous non-blank byte only. A `/`
//!   right after an operand or a keyword (`return /x/`) is read as division,
//!   and after a postfix `++`/`--` it is read as a regex. A misread can turn a
//!   valid snippet into a single `syntax-error`.
//! - No ASI, JSX or TypeScript generics awareness.

mod duplicate_blocks;
mod for_loop;
mod missing_return;
mod unused_vars;

use std::collections::HashMap;

use serde::Serialize;

/// Largest snippet `analyze` is meant for; the API rejects anything bigger.
pub const MAX_SNIPPET_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    /// 1-based.
    pub line: usize,
    /// 0-based, in chars.
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub rule: &'static str,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Run every rule. A snippet that cannot be scanned yields a single
/// `syntax-error` issue.
pub fn analyze(code: &str) -> Vec<Issue> {
    let src = match Source::prepare(code) {
        Ok(src) => src,
        Err(e) => {
            return vec![Issue {
                rule: "syntax-error",
                message: format!("Failed to parse code: {}", e.message),
                severity: Severity::Error,
                fix_hint: None,
                location: Some(e.location),
            }]
        }
    };

    let mut issues = Vec::new();
    issues.extend(unused_vars::check(&src));
    issues.extend(for_loop::check(&src));
    issues.extend(missing_return::check(&src));
    issues.extend(duplicate_blocks::check(&src));
    issues
}

#[derive(Debug)]
struct ScanError {
    message: String,
    location: Location,
}

/// A snippet with literals blanked and delimiters matched.
pub(crate) struct Source<'a> {
    pub original: &'a str,
    /// Same length as `original`; string and comment bytes replaced by spaces.
    pub code: String,
    /// `{` offset → matching `}` offset.
    pub braces: HashMap<usize, usize>,
    /// `(` offset → matching `)` offset.
    pub parens: HashMap<usize, usize>,
}

impl<'a> Source<'a> {
    fn prepare(original: &'a str) -> Result<Self, ScanError> {
        let code = blank_literals(original)?;
        let braces = match_pairs(original, &code, b'{', b'}')?;
        let parens = match_pairs(original, &code, b'(', b')')?;
        Ok(Self {
            original,
            code,
            braces,
            parens,
        })
    }

    pub fn location(&self, offset: usize) -> Location {
        location_of(self.original, offset)
    }

    /// Brace pairs sorted by opening offset.
    pub fn blocks(&self) -> Vec<(usize, usize)> {
        let mut v: Vec<(usize, usize)> = self.braces.iter().map(|(&o, &c)| (o, c)).collect();
        v.sort_unstable();
        v
    }
}

fn location_of(s: &str, offset: usize) -> Location {
    let before = &s[..offset.min(s.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Location {
        line,
        column: before[line_start..].chars().count(),
    }
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Replace string, template, regex and comment contents with spaces, keeping
/// newlines and byte offsets intact. Quote and slash delimiters are kept, and
/// so is the code inside template `${...}` interpolations.
fn blank_literals(src: &str) -> Result<String, ScanError> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment(usize),
        Str(u8, usize),
        Regex { start: usize, in_class: bool },
    }

    let bytes = src.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Code;
    // Open `${` interpolations: (template start, `{` depth inside it).
    let mut templates: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (b, next) {
                (b'/', Some(b'/')) => {
                    state = State::LineComment;
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 1;
                }
                (b'/', Some(b'*')) => {
                    state = State::BlockComment(i);
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 1;
                }
                (b'/', _) if regex_allowed(&out[..i]) => {
                    state = State::Regex {
                        start: i,
                        in_class: false,
                    };
                }
                (b'"' | b'\'' | b'`', _) => state = State::Str(b, i),
                (b'{', _) => {
                    if let Some(top) = templates.last_mut() {
                        top.1 += 1;
                    }
                }
                (b'}', _) => {
                    if let Some(top) = templates.last_mut() {
                        if top.1 == 0 {
                            let start = top.0;
                            templates.pop();
                            state = State::Str(b'`', start);
                        } else {
                            top.1 -= 1;
                        }
                    }
                }
                _ => {}
            },
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                } else {
                    out[i] = b' ';
                }
            }
            State::BlockComment(_) => {
                if b == b'*' && next == Some(b'/') {
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 1;
                    state = State::Code;
                } else if b != b'\n' {
                    out[i] = b' ';
                }
            }
            State::Str(q, start) => {
                if b == b'\\' {
                    out[i] = b' ';
                    if let Some(n) = next {
                        if n != b'\n' {
                            out[i + 1] = b' ';
                        }
                        i += 1;
                    }
                } else if b == q {
                    state = State::Code;
                } else if q == b'`' && b == b'$' && next == Some(b'{') {
                    templates.push((start, 0));
                    state = State::Code;
                    i += 1;
                } else if b == b'\n' && q != b'`' {
                    return Err(ScanError {
                        message: "unterminated string literal".into(),
                        location: location_of(src, start),
                    });
                } else {
                    out[i] = b' ';
                }
            }
            State::Regex { start, in_class } => match b {
                b'\\' => {
                    out[i] = b' ';
                    if next.is_some_and(|n| n != b'\n') {
                        out[i + 1] = b' ';
                        i += 1;
                    }
                }
                b'\n' => {
                    return Err(ScanError {
                        message: "unterminated regular expression".into(),
                        location: location_of(src, start),
                    })
                }
                b'/' if !in_class => state = State::Code,
                _ => {
                    out[i] = b' ';
                    if b == b'[' || b == b']' {
                        state = State::Regex {
                            start,
                            in_class: b == b'[',
                        };
                    }
                }
            },
        }
        i += 1;
    }

    match state {
        State::Str(_, start) => Err(ScanError {
            message: "unterminated string literal".into(),
            location: location_of(src, start),
        }),
        State::BlockComment(start) => Err(ScanError {
            message: "unterminated block comment".into(),
            location: location_of(src, start),
        }),
        State::Regex { start, .. } => Err(ScanError {
            message: "unterminated regular expression".into(),
            location: location_of(src, start),
        }),
        State::Code | State::LineComment => {
            if let Some(&(start, _)) = templates.last() {
                return Err(ScanError {
                    message: "unterminated template literal".into(),
                    location: location_of(src, start),
                });
            }
            String::from_utf8(out).map_err(|_| ScanError {
                message: "invalid UTF-8 after scanning".into(),
                location: Location { line: 1, column: 0 },
            })
        }
    }
}

/// A `/` in code opens a regex literal unless it follows an operand.
fn regex_allowed(before: &[u8]) -> bool {
    match before.iter().rev().find(|b| !b.is_ascii_whitespace()) {
        None => true,
        Some(p) => b"(,=:[!&|?{};+-*%<>~^".contains(p),
    }
}

fn match_pairs(
    original: &str,
    code: &str,
    open: u8,
    close: u8,
) -> Result<HashMap<usize, usize>, ScanError> {
    let mut pairs = HashMap::new();
    let mut stack = Vec::new();
    for (i, &b) in code.as_bytes().iter().enumerate() {
        if b == open {
            stack.push(i);
        } else if b == close {
            let Some(o) = stack.pop() else {
                return Err(ScanError {
                    message: format!("unexpected '{}'", close as char),
                    location: location_of(original, i),
                });
            };
            pairs.insert(o, i);
        }
    }
    if let Some(&o) = stack.last() {
        return Err(ScanError {
            message: format!("unclosed '{}'", open as char),
            location: location_of(original, o),
        });
    }
    Ok(pairs)
}
