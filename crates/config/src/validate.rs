//! Configuration validation.
//!
//! Walks a raw (unresolved) configuration file and reports every directive
//! that would fail to resolve, along with likely authoring mistakes, without
//! stopping at the first problem.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::{
    error::{Error, ResolveError},
    loader,
    resolve::Resolver,
    token::{Keyword, Token},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "file-ref", "token", "keyword", "sequence"
    pub category: &'static str,
    /// Dotted path, e.g. "logging.level"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb {
                0
            } else {
                1
            };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Find the best match for `needle` among `candidates` using Levenshtein
/// distance. Returns `Some(best)` if the distance is <= `max_distance`.
pub(crate) fn suggest<'a>(
    needle: &str,
    candidates: &[&'a str],
    max_distance: usize,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
///
/// Directives are resolved against the process environment.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = if let Some(p) = path {
        Some(p.to_path_buf())
    } else {
        loader::find_config_file()
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "file-ref",
                path: String::new(),
                message: "no config file found".into(),
            }],
            config_path: None,
        };
    };

    let diagnostics = match loader::load_config_value(actual_path) {
        Ok(raw) => validate_mapping(&raw, &Resolver::from_env()),
        Err(e) => vec![Diagnostic {
            severity: Severity::Error,
            category: if matches!(e, Error::Io { .. }) {
                "file-ref"
            } else {
                "syntax"
            },
            path: String::new(),
            message: e.to_string(),
        }],
    };

    ValidationResult {
        diagnostics,
        config_path,
    }
}

/// Check every leaf of a raw mapping, resolving directives with `resolver`.
pub fn validate_mapping<L: Fn(&str) -> Option<String>>(
    raw: &Map<String, Value>,
    resolver: &Resolver<L>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_mapping(raw, "", resolver, &mut diagnostics);
    diagnostics
}

fn check_mapping<L: Fn(&str) -> Option<String>>(
    map: &Map<String, Value>,
    prefix: &str,
    resolver: &Resolver<L>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => check_mapping(nested, &path, resolver, diagnostics),
            Value::Array(items) => check_sequence(items, &path, diagnostics),
            Value::String(s) => check_leaf(s, &path, resolver, diagnostics),
            _ => {},
        }
    }
}

fn check_leaf<L: Fn(&str) -> Option<String>>(
    value: &str,
    path: &str,
    resolver: &Resolver<L>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Token::Literal(text) = Token::classify(value) {
        if let Some(keyword) = bare_keyword(text) {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "keyword",
                path: path.to_string(),
                message: format!(
                    "'{keyword}' has no argument and will be kept as text; add a space and an argument"
                ),
            });
        }
        return;
    }

    match resolver.resolve_str(value) {
        Ok(Value::Null) => diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "token",
            path: path.to_string(),
            message: "environment variable is not set and has no default; value is null".into(),
        }),
        Ok(_) => {},
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: if matches!(e, ResolveError::UnknownDirective { .. }) {
                "keyword"
            } else {
                "token"
            },
            path: path.to_string(),
            message: e.to_string(),
        }),
    }
}

/// `@math` or `@format` with nothing after them; `@env` alone is a
/// directive and already fails resolution.
fn bare_keyword(text: &str) -> Option<Keyword> {
    Keyword::ALL
        .into_iter()
        .filter(|k| *k != Keyword::Env)
        .find(|k| text.trim_end() == k.as_str())
}

fn check_sequence(items: &[Value], path: &str, diagnostics: &mut Vec<Diagnostic>) {
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");
        match item {
            Value::String(s) if Token::classify(s).is_directive() => {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    category: "sequence",
                    path: item_path,
                    message: "directives inside sequences are not resolved".into(),
                });
            },
            Value::Array(nested) => check_sequence(nested, &item_path, diagnostics),
            _ => {},
        }
    }
}
