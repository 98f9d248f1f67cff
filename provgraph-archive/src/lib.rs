//! Reader for extracted ProvGraph export archives.
//!
//! An archive is a directory (container extraction happens elsewhere)
//! holding `metadata.json`, `data.json`, and a `payloads/` tree with one
//! sharded payload directory per node. This crate parses and validates
//! the two JSON files and hands out typed views; it performs no store
//! access and no semantic checks beyond structural ones.
//!
//! A format-version mismatch is rejected at [`Archive::open`], before
//! any other processing.

mod data;
mod error;
mod manifest;
mod reader;

pub use data::{ArchiveData, LinkRecord};
pub use error::{ArchiveError, ArchiveResult};
pub use manifest::{ArchiveMetadata, FieldInfo};
pub use reader::{Archive, ARCHIVE_FORMAT_VERSION, DATA_FILE, METADATA_FILE, PAYLOADS_DIR};
