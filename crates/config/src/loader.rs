use std::path::{Path, PathBuf};

use {
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    resolve::resolve_values,
    settings::Settings,
};

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &[
    "dynconf.toml",
    "dynconf.yaml",
    "dynconf.yml",
    "dynconf.json",
];

/// Load, resolve and wrap the config at `path`.
///
/// Any resolution failure is returned; nothing is partially applied.
pub fn load_config(path: &Path) -> Result<Settings> {
    let raw = load_config_value(path)?;
    debug!(path = %path.display(), keys = raw.len(), "resolving config");
    let resolved = resolve_values(&raw)?;
    Ok(Settings::from_resolved(resolved))
}

/// Read and parse the config at `path` without resolving directives.
pub fn load_config_value(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_config_value(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./dynconf.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/dynconf/dynconf.{toml,yaml,yml,json}` (user-global)
pub fn discover_and_load() -> Result<Settings> {
    let Some(path) = find_config_file() else {
        debug!("no config file found");
        return Err(Error::NotFound);
    };
    debug!(path = %path.display(), "loading config");
    load_config(&path)
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/dynconf/
    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/dynconf/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dynconf").map(|d| d.config_dir().to_path_buf())
}

/// Parse `raw` according to the extension of `path`.
pub fn parse_config_value(raw: &str, path: &Path) -> Result<Map<String, Value>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let value = match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            serde_json::to_value(v)?
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            serde_json::to_value(v)?
        },
        "json" => serde_json::from_str(raw)?,
        _ => {
            return Err(Error::UnsupportedFormat {
                extension: ext.to_string(),
            });
        },
    };

    match value {
        Value::Object(map) => Ok(map),
        // An empty YAML document.
        Value::Null => Ok(Map::new()),
        other => Err(Error::NotAMapping {
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
