//! Error types for archive reading.

use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors that can occur while reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive is structurally broken: a required file, field, or
    /// payload is missing or unreadable.
    #[error("corrupt archive: {0}")]
    Corrupt(String),

    /// The archive was written by a different format version.
    #[error("archive format version is {found}, expected {expected}")]
    VersionMismatch { found: String, expected: String },
}
