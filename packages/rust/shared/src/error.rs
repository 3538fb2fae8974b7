//! Error types for Solguide.
//!
//! Library crates use [`SolguideError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Solguide operations.
#[derive(Debug, thiserror::Error)]
pub enum SolguideError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Non-2xx response or transport failure while retrieving a source document.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Text extraction failed on an otherwise-successful fetch.
    #[error("extract error: {0}")]
    Extract(String),

    /// Neither source document URL is present on the opportunity.
    #[error("no instruction URLs available")]
    NoSources,

    /// Object-store upload failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Record-store read or patch failure.
    #[error("record store error: {0}")]
    RecordUpdate(String),

    /// Artifact rendering failure.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing row, malformed payload, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SolguideError>;

impl SolguideError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error from any displayable message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create an extract error from any displayable message.
    pub fn extract(msg: impl Into<String>) -> Self {
        Self::Extract(msg.into())
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
        let err = SolguideError::fetch("HTTP 404 for https://example.com/baa.pdf");
        assert_eq!(
            err.to_string(),
            "fetch error: HTTP 404 for https://example.com/baa.pdf"
        );

        let err = SolguideError::NoSources;
        assert_eq!(err.to_string(), "no instruction URLs available");

        let err = SolguideError::validation("opportunity 42 not found");
        assert!(err.to_string().contains("opportunity 42"));
    }
}
