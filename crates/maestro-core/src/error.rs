//! Error types for the orchestration library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all orchestration operations.
#[derive(Error, Debug)]
pub enum MaestroError {
    /// Backend request failed after all retry attempts were exhausted
    #[error("Backend request failed after {attempts} attempt(s): {message}")]
    Backend { message: String, attempts: u32 },
    /// Generation was cancelled by the caller mid-flight
    #[error("Generation cancelled")]
    Cancelled,
    /// The response stream stopped producing chunks before completion
    #[error("Response stream stalled: no data received for {seconds}s")]
    StreamStalled { seconds: u64 },
    /// A plan step's execution failed
    #[error("Step '{title}' failed: {message}")]
    StepFailed { title: String, message: String },
    /// A step offset outside the current plan was requested
    #[error("Step {index} is out of range for a plan with {len} step(s)")]
    StepOutOfRange { index: usize, len: usize },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> MaestroError {
        MaestroError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating backend errors carrying the attempt count.
pub struct BackendErrorBuilder {
    message: String,
}

impl BackendErrorBuilder {
    /// Create a new backend error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the number of attempts that were made.
    pub fn after_attempts(self, attempts: u32) -> MaestroError {
        MaestroError::Backend {
            message: self.message,
            attempts,
        }
    }
}

impl MaestroError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for backend transport errors.
    pub fn backend(message: impl Into<String>) -> BackendErrorBuilder {
        BackendErrorBuilder::new(message)
    }

    /// Creates an input validation error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MaestroError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a step failure error carrying the step title.
    pub fn step_failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        MaestroError::StepFailed {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| MaestroError::database(message).with_source(e))
    }
}

/// Specialized extension trait for file-system Results.
pub trait FsResultExt<T> {
    /// Map I/O errors, attaching the path they occurred at.
    fn fs_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T> FsResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| MaestroError::FileSystem {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, MaestroError>;
