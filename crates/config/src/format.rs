//! `@format` templates: literal text with embedded `{...}` spans, each of
//! which is resolved as a value of its own and substituted in place.
//!
//! Spans nest, so `{@format a {@env X}}` is one span. A `}` outside any span
//! is ordinary text; an unclosed `{` is an error.

use serde_json::Value;

use crate::{
    error::ResolveError,
    resolve::Resolver,
    token::{Keyword, after_keyword},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Span(&'a str),
}

impl<L: Fn(&str) -> Option<String>> Resolver<L> {
    /// Resolve an `@format` token.
    ///
    /// Every failure, including a missing keyword, is wrapped in
    /// [`ResolveError::Format`] naming the original token.
    pub fn resolve_format_token(&self, token: &str) -> Result<String, ResolveError> {
        self.resolve_format_at(token, 0)
    }

    pub(crate) fn resolve_format_at(
        &self,
        token: &str,
        depth: usize,
    ) -> Result<String, ResolveError> {
        self.render(token, depth)
            .map_err(|source| ResolveError::format(token, source))
    }

    fn render(&self, token: &str, depth: usize) -> Result<String, ResolveError> {
        if depth >= self.max_nesting {
            return Err(ResolveError::RecursionLimit {
                limit: self.max_nesting,
            });
        }

        let template = after_keyword(token, Keyword::Format)
            .ok_or_else(|| ResolveError::missing_keyword(Keyword::Format.as_str(), token))?
            .trim_start();

        let segments = split_spans(template)?;
        if !segments.iter().any(|s| matches!(s, Segment::Span(_))) {
            return Err(ResolveError::EmptyTemplate);
        }

        let mut out = String::with_capacity(template.len());
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Span(inner) => {
                    let value = self.resolve_str_at(inner, depth + 1)?;
                    push_value(&mut out, &value);
                },
            }
        }
        Ok(out)
    }
}

/// Append the text form of a resolved value; null contributes nothing.
fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {},
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

fn split_spans(template: &str) -> Result<Vec<Segment<'_>>, ResolveError> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut text_start = 0;
    let mut span_start = 0;

    for (i, ch) in template.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    if i > text_start {
                        segments.push(Segment::Text(&template[text_start..i]));
                    }
                    span_start = i + 1;
                }
                depth += 1;
            },
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    segments.push(Segment::Span(&template[span_start..i]));
                    text_start = i + 1;
                }
            },
            _ => {},
        }
    }

    if depth > 0 {
        return Err(ResolveError::UnclosedSpan {
            offset: span_start - 1,
        });
    }
    if text_start < template.len() {
        segments.push(Segment::Text(&template[text_start..]));
    }
    Ok(segments)
}
