//! Dotted-path configuration access.
//!
//! Configuration is a keyed JSON document loaded from a path (default
//! `config.json`, overridable as the program's first CLI argument). Nested
//! keys are addressed with `.`, e.g. `"server.host"`; a missing
//! intermediate key returns the caller's default rather than erroring.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ConfigError, ConfigLoadSource};

/// A loaded configuration document.
#[derive(Debug, Clone)]
pub struct Config(Value);

impl Config {
    /// Wrap an already-parsed document, e.g. a per-extension options
    /// sub-object carved out of the main configuration.
    pub fn from_value(value: Value) -> Config {
        Config(value)
    }

    /// Load and parse a JSON document from `path`.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let map_err = |source: ConfigLoadSource| ConfigError::Load {
            path: path.display().to_string(),
            source,
        };
        let text = std::fs::read_to_string(path).map_err(|e| map_err(e.into()))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| map_err(e.into()))?;
        Ok(Config(value))
    }

    /// The underlying JSON document, e.g. for extracting a sub-object
    /// that doesn't fit the dotted-path accessors below.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut current = &self.0;
        for part in key.split('.') {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Look up `key`, falling back to `default` if any segment of the
    /// dotted path is absent or does not deserialize as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_opt(key).unwrap_or(default)
    }

    /// Look up `key`, returning `None` if any segment is absent or the
    /// value does not deserialize as `T`.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Look up a key that must be present; used for the required
    /// identity/server keys.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.get_opt(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }
}
