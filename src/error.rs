//! Custom error types for project interchange
//!
//! Fatal failures are modelled here. Failures that only affect a single item
//! (one dependency, one copied file) are collected by the engines instead and
//! never become an `InterchangeError`.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for interchange operations
#[derive(Error, Debug)]
pub enum InterchangeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// The archive container could not be read
    #[error("Archive read error: {0}")]
    ArchiveRead(String),

    /// The archive could not be written
    #[error("Archive write error: {0}")]
    ArchiveWrite(String),

    /// The encrypted project descriptor could not be decoded or encoded
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// A required file or folder is missing from the input
    #[error("{0}")]
    Structural(String),

    /// Manifest or resource XML could not be parsed
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Every candidate output path was already taken
    #[error("Name collision: {} still exists after {attempts} attempts", path.display())]
    NamingCollision { path: PathBuf, attempts: u32 },

    /// The caller cancelled the operation between stages
    #[error("Operation cancelled")]
    Cancelled,

    /// Storage errors (project store JSON files)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl InterchangeError {
    /// Create a structural error for a missing input
    pub fn missing(what: impl Into<String>) -> Self {
        Self::Structural(what.into())
    }
}

impl From<std::io::Error> for InterchangeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for InterchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for InterchangeError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ArchiveRead(err.to_string())
    }
}

/// Result type alias for interchange operations
pub type InterchangeResult<T> = Result<T, InterchangeError>;
