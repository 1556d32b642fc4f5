//! Rich diagnostic error types for the eunoia engine.
//!
//! Scoring, gating and recall never fail: empty or malformed text is handled
//! by zero-length special cases. Errors only come from the outer surfaces:
//! configuration, path resolution and snapshot persistence. Each carries a
//! miette `#[diagnostic]` with an error code and help text.

use miette::Diagnostic;
use thiserror::Error;

use crate::paths::PathError;

/// Top-level error type for the eunoia engine.
#[derive(Debug, Error, Diagnostic)]
pub enum EunoiaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Paths(#[from] PathError),
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

/// Failure of a snapshot storage backend.
///
/// Always recoverable: the engine keeps its in-memory state when a save or
/// load fails.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(eunoia::persistence::io),
        help(
            "A filesystem operation failed. Check that the snapshot directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(eunoia::persistence::serde),
        help(
            "Failed to encode or decode a snapshot. The stored document may have been \
             written by an incompatible version or edited by hand."
        )
    )]
    Serialization { message: String },

    #[error("session database error: {message}")]
    #[diagnostic(
        code(eunoia::persistence::database),
        help(
            "The embedded session database reported an error. \
             Try again with a fresh data directory if the file is corrupt."
        )
    )]
    Database { message: String },

    #[error("unsupported snapshot version {found} (expected {expected})")]
    #[diagnostic(
        code(eunoia::persistence::version),
        help("Export the session with the version that created it, or start a new session.")
    )]
    UnsupportedVersion { found: u32, expected: u32 },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Failure to read, parse, encode, write or validate an engine configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(eunoia::config::read),
        help("Ensure the config file exists and is valid TOML. `eunoia config init` writes the defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(eunoia::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to serialize config for {path}: {message}")]
    #[diagnostic(
        code(eunoia::config::serialize),
        help("The in-memory configuration could not be encoded as TOML. This is a bug; please report it.")
    )]
    Serialize { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(eunoia::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(eunoia::config::invalid), help("Check the EngineConfig fields. {message}"))]
    Invalid { message: String },
}

/// Result alias for persistence operations.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for functions returning eunoia results.
pub type EunoiaResult<T> = std::result::Result<T, EunoiaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_converts_to_eunoia_error() {
        let err = PersistenceError::Serialization {
            message: "truncated".into(),
        };
        let top: EunoiaError = err.into();
        assert!(matches!(
            top,
            EunoiaError::Persistence(PersistenceError::Serialization { .. })
        ));
    }

    #[test]
    fn config_error_converts_to_eunoia_error() {
        let err = ConfigError::Invalid {
            message: "window must be > 0".into(),
        };
        let top: EunoiaError = err.into();
        assert!(matches!(top, EunoiaError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn config_serialize_error_is_not_a_parse_error() {
        let err = ConfigError::Serialize {
            path: "/tmp/config.toml".into(),
            message: "unsupported value".into(),
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("eunoia::config::serialize"));
        assert!(format!("{err}").starts_with("failed to serialize config"));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = PersistenceError::UnsupportedVersion {
            found: 7,
            expected: 1,
        };
        let msg = format!("{err}");
        assert!(msg.contains('7'));
        assert!(msg.contains('1'));
    }
}
