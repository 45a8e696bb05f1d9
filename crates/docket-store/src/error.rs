//! Error types for storage operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored file could not be decoded
    #[error("Corrupt data in {path}: {reason}")]
    Corrupt {
        /// Offending file
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// A lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;
