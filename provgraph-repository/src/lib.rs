//! Sharded filesystem payload storage for ProvGraph nodes.
//!
//! Every node owns one payload directory, addressed by a shard path
//! derived from its UUID (`ab/cd/<rest>`), so no single directory grows
//! unbounded. The import machinery relocates payload directories out of
//! archives into a live repository; it never mutates payloads in place.

use provgraph_types::EntityUuid;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The source of an ingest does not exist or is not a directory.
    #[error("payload source missing: {0}")]
    SourceMissing(PathBuf),
}

/// The shard path of a UUID: first two characters, next two, rest.
#[must_use]
pub fn shard_path(uuid: &EntityUuid) -> PathBuf {
    let canonical = uuid.canonical();
    PathBuf::from(&canonical[..2])
        .join(&canonical[2..4])
        .join(&canonical[4..])
}

/// A live payload repository rooted at one directory.
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    /// Opens (or creates) a repository rooted at `root`.
    pub fn open(root: &Path) -> RepositoryResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// The directory a node's payload lives in (whether or not it
    /// exists yet).
    #[must_use]
    pub fn payload_path(&self, uuid: &EntityUuid) -> PathBuf {
        self.root.join(shard_path(uuid))
    }

    /// Whether a payload directory exists for the node.
    #[must_use]
    pub fn contains(&self, uuid: &EntityUuid) -> bool {
        self.payload_path(uuid).is_dir()
    }

    /// Relocates a payload directory into the repository, replacing any
    /// previous payload for the same UUID.
    pub fn ingest(&self, src: &Path, uuid: &EntityUuid) -> RepositoryResult<()> {
        if !src.is_dir() {
            return Err(RepositoryError::SourceMissing(src.to_path_buf()));
        }
        let dest = self.payload_path(uuid);
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        copy_tree(src, &dest)?;
        debug!("ingested payload for {uuid}");
        Ok(())
    }

    /// SHA-256 checksum of one file inside a payload, as lowercase hex.
    pub fn file_checksum(&self, uuid: &EntityUuid, relative: &Path) -> RepositoryResult<String> {
        let path = self.payload_path(uuid).join(relative);
        let mut file = fs::File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

fn copy_tree(src: &Path, dest: &Path) -> RepositoryResult<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
