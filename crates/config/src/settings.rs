//! The resolved configuration object installed once at startup.

use std::sync::OnceLock;

use {
    chrono_tz::Tz,
    serde_json::{Map, Value},
    tracing::warn,
};

use crate::error::{Error, Result};

/// Key holding the IANA timezone name.
pub const TIMEZONE_KEY: &str = "TIMEZONE";

/// Key the application version is injected under.
pub const VERSION_KEY: &str = "VERSION";

static GLOBAL: OnceLock<Settings> = OnceLock::new();

/// Fully resolved configuration with dotted-path access.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    values: Map<String, Value>,
    timezone: Tz,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_resolved(Map::new())
    }
}

impl Settings {
    /// Wrap an already resolved mapping.
    ///
    /// `TIMEZONE` is parsed as an IANA name; when missing it is UTC, and when
    /// invalid a warning is logged and UTC is used.
    #[must_use]
    pub fn from_resolved(values: Map<String, Value>) -> Self {
        let timezone = parse_timezone(values.get(TIMEZONE_KEY));
        Self { values, timezone }
    }

    /// Record the running application version under `VERSION`.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.values
            .insert(VERSION_KEY.to_string(), Value::String(version.into()));
        self
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.get_str(VERSION_KEY)
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Look up a value by dotted path, e.g. `"logging.level"`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Like [`Self::get`], but a missing key is an error.
    pub fn require(&self, path: &str) -> Result<&Value> {
        self.get(path).ok_or_else(|| Error::key_not_found(path))
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    #[must_use]
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path)?.as_i64()
    }

    #[must_use]
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    #[must_use]
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// A nested mapping by dotted path.
    #[must_use]
    pub fn section(&self, path: &str) -> Option<&Map<String, Value>> {
        self.get(path)?.as_object()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

fn parse_timezone(value: Option<&Value>) -> Tz {
    let Some(value) = value else {
        return Tz::UTC;
    };
    match value.as_str().map(str::parse::<Tz>) {
        Some(Ok(tz)) => tz,
        Some(Err(e)) => {
            warn!(timezone = %value, error = %e, "invalid timezone, falling back to UTC");
            Tz::UTC
        },
        None => {
            warn!(timezone = %value, "timezone must be a string, falling back to UTC");
            Tz::UTC
        },
    }
}

/// Install the process-wide configuration. Only the first call succeeds.
pub fn install(settings: Settings) -> Result<&'static Settings> {
    GLOBAL
        .set(settings)
        .map_err(|_| Error::AlreadyInstalled)?;
    GLOBAL.get().ok_or(Error::AlreadyInstalled)
}

/// The installed configuration, if any.
#[must_use]
pub fn global() -> Option<&'static Settings> {
    GLOBAL.get()
}
