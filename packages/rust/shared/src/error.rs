//! Error types for Tadka.
//!
//! Library crates use [`TadkaError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Tadka operations.
#[derive(Debug, thiserror::Error)]
pub enum TadkaError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page, feed, or image.
    #[error("network error: {0}")]
    Network(String),

    /// HTML/RSS parsing or field extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown agent kind, bad state code, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Media store error (image download or file write).
    #[error("media error: {0}")]
    Media(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TadkaError>;

impl TadkaError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TadkaError::config("database_path must not be empty");
        assert_eq!(
            err.to_string(),
            "config error: database_path must not be empty"
        );

        let err = TadkaError::validation("unknown agent kind 'podcast'");
        assert!(err.to_string().contains("podcast"));

        let err = TadkaError::Media("disk full".into());
        assert_eq!(err.to_string(), "media error: disk full");
    }
}
