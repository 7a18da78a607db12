//! Error types for the bot core.
//!
//! Each failure domain gets its own `thiserror`-derived enum rather than one
//! catch-all: configuration problems are fatal before the run loop starts,
//! command parse failures are logged and the offending line dropped,
//! extension-load failures abort just the loader.

use thiserror::Error;

/// Raised when the configuration document is missing a required key or the
/// key has the wrong shape. Fatal: surfaced before the run loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required dotted-path key was absent or the wrong type.
    #[error("mis-configured key '{0}': please check your configuration")]
    MissingKey(String),

    /// The configuration file could not be read or parsed as JSON.
    #[error("failed to load configuration from {path}: {source}")]
    Load {
        /// Path that was read.
        path: String,
        /// Underlying I/O or JSON error.
        #[source]
        source: ConfigLoadSource,
    },
}

/// The two ways loading a config document can fail.
#[derive(Debug, Error)]
pub enum ConfigLoadSource {
    /// Opening or reading the file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents were not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raised by [`crate::command::Command::parse`] on a malformed wire line.
/// Never fatal to the connection: the caller logs and drops the line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    /// The line was empty after stripping CRLF.
    #[error("empty line")]
    EmptyLine,

    /// A `:prefix` token was present but had no following kind token.
    #[error("missing command after prefix")]
    MissingKind,
}

/// Raised while registering an extension module.
/// A single module's validation failure is logged and skipped; it does not
/// abort the loader.
#[derive(Debug, Error)]
pub enum LoadError {
    /// One of the four required metadata attributes was absent.
    #[error("extension '{identifier}' is missing required metadata: {attribute}")]
    MissingMetadata {
        /// The candidate's declared identifier, if any was recoverable.
        identifier: String,
        /// Which attribute was missing.
        attribute: &'static str,
    },
}

/// Raised when a requested extension's dependency graph cannot be
/// satisfied. Unlike [`LoadError`], this aborts the load of the requesting
/// module (and, transitively, anything that depends on it).
#[derive(Debug, Error)]
pub enum DependencyError {
    /// No registered module provides the named identifier.
    #[error("unsatisfied dependency '{dependency}' for extension '{requirer}'")]
    Unsatisfied {
        /// The module that declared the dependency.
        requirer: String,
        /// The identifier it could not find.
        dependency: String,
    },

    /// The recursion depth guard tripped (almost always a dependency
    /// cycle, occasionally a pathologically deep chain).
    #[error("dependency resolution for '{0}' bounced around too many times (cycle?)")]
    DepthExceeded(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::MissingKey("identity.nick".into());
        assert_eq!(
            err.to_string(),
            "mis-configured key 'identity.nick': please check your configuration"
        );
    }

    #[test]
    fn dependency_error_display() {
        let err = DependencyError::Unsatisfied {
            requirer: "tweeter".into(),
            dependency: "http".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsatisfied dependency 'http' for extension 'tweeter'"
        );
    }
}
