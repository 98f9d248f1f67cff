//! Core identifier types for ProvGraph.
//!
//! Distinguishes the three id spaces that the import machinery must never
//! confuse: globally unique entity UUIDs, store-local sequential ids, and
//! archive-local ids that are only meaningful inside one archive file.

mod ids;

pub use ids::{ArchiveId, EntityUuid, StoreId};
