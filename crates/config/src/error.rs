use thiserror::Error;

/// Failure while resolving a single configuration value.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("'{keyword}' not found in token: {token}")]
    MissingKeyword {
        keyword: &'static str,
        token: String,
    },

    #[error(
        "unknown directive '{word}': did you mean '{suggestion}'? Keywords are lowercase and followed by a space"
    )]
    UnknownDirective {
        word: String,
        suggestion: &'static str,
    },

    #[error("environment variable name missing in @env token: {token}")]
    MissingName { token: String },

    #[error("Invalid @math expression: {token}. Error: {source}")]
    Math {
        token: String,
        #[source]
        source: MathError,
    },

    #[error("no tokens found in @format token")]
    EmptyTemplate,

    #[error("unclosed '{{' at offset {offset}")]
    UnclosedSpan { offset: usize },

    #[error("Invalid @format token: {token}. Error: {source}")]
    Format {
        token: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("@format nesting exceeds the limit of {limit}")]
    RecursionLimit { limit: usize },
}

impl ResolveError {
    #[must_use]
    pub fn missing_keyword(keyword: &'static str, token: impl Into<String>) -> Self {
        Self::MissingKeyword {
            keyword,
            token: token.into(),
        }
    }

    #[must_use]
    pub fn unknown_directive(word: impl Into<String>, suggestion: &'static str) -> Self {
        Self::UnknownDirective {
            word: word.into(),
            suggestion,
        }
    }

    #[must_use]
    pub fn format(token: impl Into<String>, source: ResolveError) -> Self {
        Self::Format {
            token: token.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, following `@format` wrapping.
    #[must_use]
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            Self::Format { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Failure while parsing or evaluating an `@math` expression.
#[derive(Debug, Error)]
pub enum MathError {
    #[error("unsupported binary operator: {op}")]
    UnsupportedBinaryOperator { op: String },

    #[error("unsupported unary operator: {op}")]
    UnsupportedUnaryOperator { op: String },

    #[error("unsupported expression: {kind}")]
    UnsupportedExpression { kind: String },

    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("expression has more than {limit} nodes")]
    TooLarge { limit: usize },

    #[error("failed to evaluate expression '{expr}': {source}")]
    Evaluation {
        expr: String,
        #[source]
        source: ArithmeticError,
    },
}

impl MathError {
    pub(crate) fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn unsupported_expression(kind: impl Into<String>) -> Self {
        Self::UnsupportedExpression { kind: kind.into() }
    }
}

/// Runtime fault raised while evaluating a well-formed expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("result is not a finite number")]
    NonFinite,
}

/// Failure while loading or accessing configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("configuration root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("no configuration file found")]
    NotFound,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("configuration key '{key}' not found")]
    KeyNotFound { key: String },

    #[error("configuration already installed")]
    AlreadyInstalled,
}

impl Error {
    #[must_use]
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    #[must_use]
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
