//! Dispatch of leaf values to their resolvers, and the recursive walk over a
//! configuration mapping.

use {
    serde_json::{Map, Value},
    tracing::{debug, trace},
};

use crate::{
    env::process_env,
    error::ResolveError,
    math::resolve_math_token,
    token::{Token, leading_word},
};

/// Default limit on `@format` tokens nested inside one another.
pub const DEFAULT_MAX_NESTING: usize = 16;

/// Lookup function type used by [`Resolver::from_env`].
pub type ProcessLookup = fn(&str) -> Option<String>;

/// Resolves directive tokens against an environment lookup.
///
/// The resolver holds no mutable state; one value can be shared freely
/// across threads when the lookup can.
#[derive(Debug, Clone)]
pub struct Resolver<L> {
    pub(crate) lookup: L,
    pub(crate) max_nesting: usize,
}

impl Resolver<ProcessLookup> {
    /// Resolver reading from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(process_env)
    }
}

impl Default for Resolver<ProcessLookup> {
    fn default() -> Self {
        Self::from_env()
    }
}

impl<L: Fn(&str) -> Option<String>> Resolver<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Override the `@format` nesting limit.
    #[must_use]
    pub fn with_max_nesting(mut self, limit: usize) -> Self {
        self.max_nesting = limit;
        self
    }

    /// Resolve a single leaf value. Anything other than a string is returned
    /// unchanged, including sequences and mappings.
    pub fn resolve_value(&self, value: &Value) -> Result<Value, ResolveError> {
        match value {
            Value::String(s) => self.resolve_str(s),
            other => Ok(other.clone()),
        }
    }

    /// Resolve a single string leaf.
    pub fn resolve_str(&self, value: &str) -> Result<Value, ResolveError> {
        self.resolve_str_at(value, 0)
    }

    pub(crate) fn resolve_str_at(&self, value: &str, depth: usize) -> Result<Value, ResolveError> {
        match Token::classify(value) {
            Token::Env(token) => {
                trace!(depth, "resolving @env token");
                Ok(self
                    .resolve_env_token(token)?
                    .map_or(Value::Null, Value::String))
            },
            Token::Math(token) => {
                trace!(depth, "resolving @math token");
                Ok(resolve_math_token(token)?.into())
            },
            Token::Format(token) => {
                trace!(depth, "resolving @format token");
                Ok(Value::String(self.resolve_format_at(token, depth)?))
            },
            Token::Malformed { token, suggestion } => {
                let word = leading_word(token);
                debug!(word = %word, %suggestion, "value looks like a misspelled directive");
                Err(ResolveError::unknown_directive(word, suggestion.as_str()))
            },
            Token::Literal(text) => Ok(Value::String(text.to_string())),
        }
    }

    /// Rebuild `current` with every leaf resolved, recursing into nested
    /// mappings. The input is left untouched and key order is preserved.
    pub fn resolve_nested_dict(
        &self,
        current: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ResolveError> {
        let mut resolved = Map::with_capacity(current.len());
        for (key, value) in current {
            let value = match value {
                Value::Object(nested) => Value::Object(self.resolve_nested_dict(nested)?),
                leaf => self.resolve_value(leaf).inspect_err(|error| {
                    debug!(key = %key, %error, "failed to resolve config value");
                })?,
            };
            resolved.insert(key.clone(), value);
        }
        Ok(resolved)
    }

    /// Top-level entry point; identical to [`Self::resolve_nested_dict`].
    pub fn resolve_values(
        &self,
        config: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ResolveError> {
        self.resolve_nested_dict(config)
    }
}

/// Resolve a single value against the process environment.
pub fn resolve_value(value: &Value) -> Result<Value, ResolveError> {
    Resolver::from_env().resolve_value(value)
}

/// Resolve an `@env` token against the process environment.
pub fn resolve_env_token(token: &str) -> Result<Option<String>, ResolveError> {
    Resolver::from_env().resolve_env_token(token)
}

/// Resolve an `@format` token against the process environment.
pub fn resolve_format_token(token: &str) -> Result<String, ResolveError> {
    Resolver::from_env().resolve_format_token(token)
}

/// Recursively resolve a mapping against the process environment.
pub fn resolve_nested_dict(
    current: &Map<String, Value>,
) -> Result<Map<String, Value>, ResolveError> {
    Resolver::from_env().resolve_nested_dict(current)
}

/// Resolve every directive in a nested configuration mapping, returning a new
/// mapping of the same shape.
///
/// Directives:
/// - `@env NAME[,DEFAULT]`: value of an environment variable, with an
///   optional fallback.
/// - `@math EXPR`: arithmetic over `+ - * / ( )` and numeric literals.
/// - `@format TEXT{TOKEN}...`: each `{...}` span is resolved as a value of its
///   own and substituted into the text.
///
/// ```text
/// "@env ENV_VAR,default_value"
/// "@format {@env HOST,localhost}:{@math 8000 + 80}"
/// "@math 1 + 2 * 3"
/// ```
pub fn resolve_values(config: &Map<String, Value>) -> Result<Map<String, Value>, ResolveError> {
    Resolver::from_env().resolve_values(config)
}
