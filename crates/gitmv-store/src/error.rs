//! Store error types

use gitmv_core::GitmvError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from archive, lock, and preference operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Tar read/write failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// zstd encode/decode failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Archive entry would escape the extraction directory
    #[error("Unsafe archive entry: {0}")]
    UnsafeEntry(String),

    /// Lock already held by another process
    #[error("Locked: {}", .0.display())]
    Locked(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a compression error
    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }
}

impl From<StoreError> for GitmvError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Locked(path) => GitmvError::Locked(path),
            StoreError::Io(e) => GitmvError::Io(e),
            StoreError::Json(e) => GitmvError::Json(e),
            other => GitmvError::archive(other.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
