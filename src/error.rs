//! Error types for the dirdigest library
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Read and write
//! paths share the same discipline: the error is returned to the caller with
//! the path that caused it, and nothing is retried or skipped.

use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the dirdigest library
pub type Result<T> = std::result::Result<T, DigestError>;

/// Main error type for all dirdigest operations
#[derive(Debug, Error)]
pub enum DigestError {
    /// Argument does not denote an existing directory or file where one is required
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath {
        /// Offending path
        path: PathBuf,
        /// What was expected at that path
        reason: String,
    },

    /// I/O failure while opening or streaming a file's bytes
    #[error("Cannot read {path:?}: {source}")]
    UnreadableFile {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Requested digest width is not one of 256, 384, 512
    #[error("Invalid digest width '{0}' (valid widths: 256, 384, 512)")]
    InvalidDigestWidth(String),

    /// Persisted index cannot be parsed into the index shape
    #[error("Index file invalid {path:?}: {reason}")]
    MalformedIndex {
        /// Index file (or a placeholder for in-memory input)
        path: PathBuf,
        /// Parse or validation failure
        reason: String,
    },

    /// A built index could not be persisted
    #[error("Cannot write index to {path:?}: {source}")]
    WriteFailure {
        /// Requested output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("Walk directory error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Path is not valid UTF-8 and cannot be used as an index key
    #[error("Path conversion error: {0:?}")]
    PathConversion(OsString),

    /// Worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DigestError {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DigestError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unreadable file error
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DigestError::UnreadableFile {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed index error
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DigestError::MalformedIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by user input rather than the environment
    ///
    /// The command line tools exit with status 2 for these and 1 otherwise.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DigestError::InvalidPath { .. }
                | DigestError::InvalidDigestWidth(_)
                | DigestError::MalformedIndex { .. }
                | DigestError::InvalidConfiguration(_)
        )
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_input_error() {
            2
        } else {
            1
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            DigestError::InvalidPath { path, reason } => {
                format!("{} ({}). Check the path and try again.", path.display(), reason)
            }
            DigestError::InvalidDigestWidth(width) => {
                format!("'{}' is not a supported digest width. Use one of: 256, 384, 512.", width)
            }
            DigestError::MalformedIndex { path, reason } => {
                format!(
                    "The index file '{}' is not a valid directory index: {}. \
                     Rebuild it with 'dirdigest build'.",
                    path.display(),
                    reason
                )
            }
            DigestError::WriteFailure { path, source } => {
                format!(
                    "Could not write the index to '{}': {}. The index was built and can be \
                     written again to another location.",
                    path.display(),
                    source
                )
            }
            _ => self.to_string(),
        }
    }
}
