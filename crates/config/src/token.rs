//! Classification of configuration strings into resolution directives.
//!
//! A directive keyword must sit at the very start of the string and be
//! followed by a space. `@env` alone is also a directive (it fails later
//! with a missing-name error).
//!
//! Strings that start with something close to a keyword (a typo within two
//! edits, different letter case, or a tab instead of the space) are
//! malformed directives and fail resolution. Everything else is a plain
//! literal.

/// Directive keywords understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Env,
    Math,
    Format,
}

impl Keyword {
    pub const ALL: [Self; 3] = [Self::Env, Self::Math, Self::Format];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Env => "@env",
            Self::Math => "@math",
            Self::Format => "@format",
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf string, tagged with the resolver it routes to.
///
/// Directive variants borrow the whole original string; resolvers need it
/// for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Env(&'a str),
    Math(&'a str),
    Format(&'a str),
    /// Looks like a directive but is not spelled as one.
    Malformed {
        token: &'a str,
        suggestion: Keyword,
    },
    Literal(&'a str),
}

impl<'a> Token<'a> {
    #[must_use]
    pub fn classify(value: &'a str) -> Self {
        if value == Keyword::Env.as_str() || has_directive_prefix(value, Keyword::Env) {
            Self::Env(value)
        } else if has_directive_prefix(value, Keyword::Math) {
            Self::Math(value)
        } else if has_directive_prefix(value, Keyword::Format) {
            Self::Format(value)
        } else if let Some(suggestion) = misspelled_keyword(value) {
            Self::Malformed {
                token: value,
                suggestion,
            }
        } else {
            Self::Literal(value)
        }
    }

    #[must_use]
    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            Self::Env(_) => Some(Keyword::Env),
            Self::Math(_) => Some(Keyword::Math),
            Self::Format(_) => Some(Keyword::Format),
            Self::Malformed { .. } | Self::Literal(_) => None,
        }
    }

    #[must_use]
    pub fn is_directive(&self) -> bool {
        self.keyword().is_some()
    }
}

fn has_directive_prefix(value: &str, keyword: Keyword) -> bool {
    value
        .strip_prefix(keyword.as_str())
        .is_some_and(|rest| rest.starts_with(' '))
}

/// Everything after the first occurrence of `keyword`, or `None` if the
/// keyword does not appear.
pub(crate) fn after_keyword(token: &str, keyword: Keyword) -> Option<&str> {
    let marker = keyword.as_str();
    token.find(marker).map(|idx| &token[idx + marker.len()..])
}

/// If `value` starts with something that reads like a misspelled directive
/// (for example `@ev NAME`, `@MATH 1 + 1` or `@env<TAB>NAME`), return the
/// keyword it was probably meant to be.
///
/// Correctly written directives and bare `@math` / `@format` return `None`.
#[must_use]
pub fn misspelled_keyword(value: &str) -> Option<Keyword> {
    if !value.starts_with('@') {
        return None;
    }
    let word = value.split(char::is_whitespace).next().unwrap_or(value);
    let lower = word.to_lowercase();

    if let Some(keyword) = Keyword::ALL.into_iter().find(|k| k.as_str() == lower) {
        let separator = value[word.len()..].chars().next();
        let well_formed = word == keyword.as_str() && separator.is_none_or(|c| c == ' ');
        return (!well_formed).then_some(keyword);
    }

    let candidates = Keyword::ALL.map(Keyword::as_str);
    let best = crate::validate::suggest(&lower, &candidates, 2)?;
    Keyword::ALL.into_iter().find(|k| k.as_str() == best)
}

/// The leading word of a malformed directive, with a non-space separator
/// kept and escaped so it shows up in messages.
pub(crate) fn leading_word(value: &str) -> String {
    let word = value
        .split_inclusive(char::is_whitespace)
        .next()
        .unwrap_or(value)
        .trim_end_matches(' ');
    word.escape_debug().to_string()
}
