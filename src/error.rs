//! Error types for kvlite
//!
//! Provides a unified error type for all store operations.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for kvlite operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// The backing location could not be opened or the schema not created.
    /// No store handle exists after this error.
    #[error("Failed to open store at {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Store is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Operation Errors
    // -------------------------------------------------------------------------
    #[error("Read failed: {0}")]
    Read(#[source] rusqlite::Error),

    #[error("Write failed: {0}")]
    Write(#[source] rusqlite::Error),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Timed out after {0:?} waiting for the store lock")]
    LockTimeout(Duration),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
