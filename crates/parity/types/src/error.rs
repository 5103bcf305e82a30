//! Error types for parity-types.
//!
//! Configuration problems are fatal at startup: a malformed tolerance pattern or
//! an unreadable settings file is reported before any comparison work begins.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A path pattern could not be parsed.
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A tolerance was negative, NaN or infinite.
    #[error("invalid tolerance {value} for '{scope}': tolerances must be finite and non-negative")]
    InvalidTolerance { scope: String, value: f64 },

    /// The file extension does not name a supported format.
    #[error("unsupported configuration format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The file could not be read or written.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected model.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file is not valid YAML for the expected model.
    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_display() {
        let e = ConfigError::InvalidPattern {
            pattern: "a//b".into(),
            reason: "empty segment".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("a//b"));
        assert!(msg.contains("empty segment"));
    }

    #[test]
    fn invalid_tolerance_display() {
        let e = ConfigError::InvalidTolerance {
            scope: "default".into(),
            value: -1.0,
        };
        assert!(e.to_string().contains("non-negative"));
    }

    #[test]
    fn unsupported_format_display() {
        let e = ConfigError::UnsupportedFormat {
            path: PathBuf::from("settings.toml"),
        };
        assert!(e.to_string().contains("settings.toml"));
    }
}
