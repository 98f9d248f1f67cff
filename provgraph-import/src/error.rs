//! Error taxonomy for the import pipeline.
//!
//! Every variant is fatal to the in-progress import: nothing is locally
//! recovered or retried, and any error aborts the transaction and rolls
//! back every write. The caller receives either a complete
//! [`crate::ImportReport`] or exactly one of these.

use provgraph_archive::ArchiveError;
use provgraph_repository::RepositoryError;
use provgraph_store::StoreError;
use thiserror::Error;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Errors that can abort an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The archive schema declares a dependency on a kind that would be
    /// processed later (or that is not processed at all).
    #[error("entity {entity} requires {requires} but would be processed first")]
    SchemaOrderViolation { entity: String, requires: String },

    /// The archive schema names an entity kind outside the canonical
    /// list.
    #[error("unknown entity type in archive schema: {0}")]
    UnknownEntityType(String),

    /// The archive is structurally broken: a missing record section,
    /// field, attributes/extras entry, or payload directory.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// A link or group-membership endpoint could not be resolved and
    /// the unknown-node policy is `Fail`.
    #[error("dangling reference: {0}")]
    DanglingReference(String),

    /// No unique value could be derived within the candidate bound.
    #[error("a unique value could not be derived from '{value}': all {attempts} candidates taken")]
    UniquenessExhausted { value: String, attempts: u32 },

    /// A link violated a semantic rule.
    #[error("link validation failed: {rule}")]
    LinkValidation { rule: String },

    /// Archive-level failure (version mismatch, unreadable file).
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Store-level failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Repository-level failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
