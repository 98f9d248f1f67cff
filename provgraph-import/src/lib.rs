//! Archive import pipeline for ProvGraph.
//!
//! Restores a serialized provenance graph into a store while preserving
//! global identity and guaranteeing all-or-nothing application.
//!
//! # Pipeline
//!
//! 1. **Ordering** — the archive schema's field dependencies are
//!    checked against the canonical entity-kind order before any write.
//! 2. **Identity** — per kind, archive records are classified as
//!    *existing* (matched in the store by natural key — email for
//!    users, canonical UUID otherwise) or *new*, via one bulk
//!    membership query.
//! 3. **Deduplication** — group labels and computer names that would
//!    collide store-wide are renamed deterministically, within a
//!    bounded number of candidates.
//! 4. **Merge** — extras and comments of already-existing entities are
//!    merged under the caller's policies instead of overwritten.
//! 5. **Links & groups** — after every entity is persisted (flushed,
//!    so store ids are known), links are validated and created
//!    idempotently, archived memberships are replayed, and all touched
//!    nodes land in a destination group.
//! 6. **Transaction** — everything above runs in one store
//!    transaction; any failure rolls back all of it.
//!
//! # Example
//!
//! ```no_run
//! use provgraph_archive::Archive;
//! use provgraph_import::{ArchiveImporter, ImportOptions};
//! use provgraph_repository::Repository;
//! use provgraph_store::ProvStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = ProvStore::open(Path::new("graph.db"))?;
//! let repository = Repository::open(Path::new("repository"))?;
//! let archive = Archive::open(Path::new("extracted-archive"))?;
//!
//! let report = ArchiveImporter::new(ImportOptions::default())
//!     .run(&mut store, &repository, &archive)?;
//! println!("{} new links", report.links_created.len());
//! # Ok(())
//! # }
//! ```

mod dedup;
mod error;
mod groups;
mod identity;
mod importer;
mod links;
mod merge;
mod options;
mod ordering;
mod progress;
mod report;
mod rows;

pub use dedup::MAX_UNIQUENESS_CANDIDATES;
pub use error::{ImportError, ImportResult};
pub use identity::IdentityResolver;
pub use importer::ArchiveImporter;
pub use merge::{
    merge_comment, merge_extras, sanitize_extras, CommentDecision, ExtrasMergeOutcome,
};
pub use options::{
    CommentMergePolicy, ConflictResolution, ExistingExtras, ExtrasMergePolicy, ImportOptions,
    IncomingExtras, NewExtrasPolicy, UnknownNodePolicy,
};
pub use ordering::validated_entity_order;
pub use progress::{ImportObserver, ImportPhase, NoopObserver};
pub use report::{DeferredExtra, EntityOutcome, ImportReport};
