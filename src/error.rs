//! Error handling module
//!
//! This module provides unified error handling for the bench-history library and CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the application
#[derive(Debug, Error)]
pub enum Error {
    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The data literal is not valid JSON
    #[error("JSON error at line {line}, column {column}: {source}")]
    Json {
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Input contains no `window.BENCHMARK_DATA` assignment and no bare JSON object
    #[error("No benchmark data payload found: {0}")]
    MissingPayload(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Git invocation failed while reading history
    #[error("Git error: {0}")]
    Git(String),

    /// Requested report name is not present in the dataset
    #[error("Unknown report '{name}' (available: {available})")]
    UnknownReport { name: String, available: String },

    /// A path could not be expressed relative to the repository
    #[error("Path '{}' is not inside repository '{}'", path.display(), root.display())]
    OutsideRepository { path: PathBuf, root: PathBuf },

    /// Processing errors with custom messages
    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    /// Create a processing error with a custom message
    pub fn processing_error(message: impl Into<String>) -> Self {
        Error::Processing(message.into())
    }

    /// Wrap a serde_json error, keeping its position
    pub fn json(source: serde_json::Error) -> Self {
        Error::Json {
            line: source.line(),
            column: source.column(),
            source,
        }
    }

    /// Map the context/message of this error using a transformation function
    ///
    /// Only message-carrying variants are rewritten; structured variants pass through.
    pub fn map_context<F>(self, f: F) -> Self
    where
        F: FnOnce(String) -> String,
    {
        match self {
            Error::Processing(msg) => Error::Processing(f(msg)),
            Error::Git(msg) => Error::Git(f(msg)),
            Error::MissingPayload(msg) => Error::MissingPayload(f(msg)),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::json(err)
    }
}

/// Functional extensions for Result types
pub trait ResultExt<T> {
    /// Add context to an error using a closure
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.map_context(|msg| format!("{}: {}", f(), msg)))
    }
}
