//! Error types for the arnica pipeline.
//!
//! All fallible operations in this crate return [`Result`]. Only storage and
//! configuration failures surface here; data-quality problems (missing ids,
//! empty documents) and scoring failures are absorbed inside the runner and
//! never become errors.

use thiserror::Error;

/// The unified error type for the arnica library.
#[derive(Error, Debug)]
pub enum ArnicaError {
    /// An argument passed to an API was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration value was invalid (bad shard identifier, missing
    /// required columns, zero shard count).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required file or resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A durable read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// An internal invariant was violated (this is a bug).
    #[error("internal error: {0}")]
    Internal(String),

    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from CSV serialization or deserialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error from JSON serialization or deserialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArnicaError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ArnicaError::InvalidArgument(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ArnicaError::InvalidConfig(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        ArnicaError::NotFound(msg.into())
    }

    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ArnicaError::Storage(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ArnicaError::Internal(msg.into())
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ArnicaError>;
