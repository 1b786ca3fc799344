//! Error types for session configuration.

use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// Invalid TOML in configuration file.
    #[error("Invalid TOML in {file}: {error}")]
    InvalidToml {
        /// The file path.
        file: String,
        /// The error message.
        error: String,
    },

    /// The remote URL is missing or has no scheme.
    #[error("Invalid remote URL: {0:?}")]
    InvalidRemoteUrl(String),

    /// An allowlist entry is not an http(s) URL prefix.
    #[error("Invalid allowlist entry: {0:?}")]
    InvalidAllowlistEntry(String),

    /// A budget value is out of range.
    #[error("Invalid limit {field}: {value}")]
    InvalidLimit {
        /// The offending field name.
        field: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
