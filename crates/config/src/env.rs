//! `@env NAME[,DEFAULT]` lookups.

use tracing::trace;

use crate::{
    error::ResolveError,
    resolve::Resolver,
    token::{Keyword, after_keyword},
};

/// Lookup backed by the process environment.
///
/// Variables whose value is not valid unicode are treated as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl<L: Fn(&str) -> Option<String>> Resolver<L> {
    /// Resolve an `@env` token against this resolver's lookup.
    pub fn resolve_env_token(&self, token: &str) -> Result<Option<String>, ResolveError> {
        resolve_env_token_with(token, &self.lookup)
    }
}

/// Resolve an `@env NAME[,DEFAULT]` token using a custom lookup function.
///
/// The text after the keyword is split on the first comma; both halves are
/// trimmed. Returns the variable's value when set, otherwise the default
/// (or `None` when there is none). No type coercion happens here.
pub fn resolve_env_token_with(
    token: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<String>, ResolveError> {
    let rest = after_keyword(token, Keyword::Env)
        .ok_or_else(|| ResolveError::missing_keyword(Keyword::Env.as_str(), token))?;

    let (name, default) = match rest.split_once(',') {
        Some((name, default)) => (name.trim(), Some(default.trim())),
        None => (rest.trim(), None),
    };

    if name.is_empty() {
        return Err(ResolveError::MissingName {
            token: token.to_string(),
        });
    }

    match lookup(name) {
        Some(value) => {
            trace!(name, "resolved @env from environment");
            Ok(Some(value))
        },
        None => {
            trace!(name, has_default = default.is_some(), "environment variable not set");
            Ok(default.map(str::to_string))
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "ENV_VAR" => Some("env_var_value".to_string()),
            "EMPTY_VAR" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn returns_value_when_set() {
        assert_eq!(
            resolve_env_token_with("@env ENV_VAR,default_value", lookup).unwrap(),
            Some("env_var_value".to_string())
        );
    }

    #[test]
    fn falls_back_to_default_when_unset() {
        assert_eq!(
            resolve_env_token_with("@env OTHER_VAR,default_value", lookup).unwrap(),
            Some("default_value".to_string())
        );
    }

    #[test]
    fn returns_none_without_default() {
        assert_eq!(resolve_env_token_with("@env OTHER_VAR", lookup).unwrap(), None);
    }

    #[test]
    fn set_but_empty_is_not_replaced_by_default() {
        assert_eq!(
            resolve_env_token_with("@env EMPTY_VAR,fallback", lookup).unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn trims_name_and_default() {
        assert_eq!(
            resolve_env_token_with("@env   OTHER_VAR ,  spaced  ", lookup).unwrap(),
            Some("spaced".to_string())
        );
    }

    #[test]
    fn default_keeps_later_commas() {
        assert_eq!(
            resolve_env_token_with("@env OTHER_VAR,a,b", lookup).unwrap(),
            Some("a,b".to_string())
        );
    }

    #[test]
    fn empty_default_is_empty_string() {
        assert_eq!(
            resolve_env_token_with("@env OTHER_VAR,", lookup).unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn missing_keyword_is_reported() {
        let err = resolve_env_token_with("@ev ENV_VAR,default_value", lookup).unwrap_err();
        assert!(matches!(err, ResolveError::MissingKeyword { keyword: "@env", .. }));
        assert_eq!(
            err.to_string(),
            "'@env' not found in token: @ev ENV_VAR,default_value"
        );
    }

    #[test]
    fn missing_name_is_reported() {
        for token in ["@env", "@env   ", "@env ,default"] {
            let err = resolve_env_token_with(token, lookup).unwrap_err();
            assert!(
                matches!(err, ResolveError::MissingName { .. }),
                "expected missing name for {token:?}, got {err:?}"
            );
            assert!(
                err.to_string()
                    .contains("environment variable name missing in @env token")
            );
        }
    }

    #[test]
    fn process_env_reads_cargo_variables() {
        assert_eq!(
            process_env("CARGO_PKG_NAME").as_deref(),
            Some(env!("CARGO_PKG_NAME"))
        );
        assert_eq!(process_env("DYNCONF_SURELY_UNSET_VARIABLE_XYZ"), None);
    }
}
