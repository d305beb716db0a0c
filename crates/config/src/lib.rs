//! Configuration loading, directive resolution and validation.
//!
//! Config files: `dynconf.toml`, `dynconf.yaml`, `dynconf.yml` or
//! `dynconf.json`, searched in `./` then `~/.config/dynconf/`.
//!
//! String values may carry directives that are resolved once at startup:
//! `@env NAME[,DEFAULT]`, `@math EXPR` and `@format TEXT{TOKEN}...`.

pub mod env;
pub mod error;
pub mod format;
pub mod loader;
pub mod math;
pub mod resolve;
pub mod settings;
pub mod token;
pub mod validate;

pub use {
    env::resolve_env_token_with,
    error::{ArithmeticError, Error, MathError, ResolveError, Result},
    loader::{discover_and_load, find_config_file, load_config, load_config_value},
    math::{Number, eval_ast, resolve_math_token},
    resolve::{
        Resolver, resolve_env_token, resolve_format_token, resolve_nested_dict, resolve_value,
        resolve_values,
    },
    settings::Settings,
    token::{Keyword, Token},
    validate::{Diagnostic, Severity, ValidationResult},
};
