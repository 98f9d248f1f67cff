use crate::data::ArchiveData;
use crate::error::{ArchiveError, ArchiveResult};
use crate::manifest::ArchiveMetadata;
use provgraph_repository::shard_path;
use provgraph_types::EntityUuid;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The format version this reader understands. Anything else is
/// rejected up front.
pub const ARCHIVE_FORMAT_VERSION: &str = "1.0";

/// File holding the schema and format version.
pub const METADATA_FILE: &str = "metadata.json";

/// File holding the exported records.
pub const DATA_FILE: &str = "data.json";

/// Subdirectory holding node payloads, sharded like a live repository.
pub const PAYLOADS_DIR: &str = "payloads";

/// An extracted archive, parsed and version-checked.
#[derive(Debug)]
pub struct Archive {
    root: PathBuf,
    metadata: ArchiveMetadata,
    data: ArchiveData,
}

impl Archive {
    /// Opens an extracted archive directory.
    ///
    /// Fails with [`ArchiveError::VersionMismatch`] if the format
    /// version differs from [`ARCHIVE_FORMAT_VERSION`], and with
    /// [`ArchiveError::Corrupt`] for a missing or unparseable file.
    pub fn open(root: &Path) -> ArchiveResult<Self> {
        let metadata: ArchiveMetadata = read_json(root, METADATA_FILE)?;
        if metadata.format_version != ARCHIVE_FORMAT_VERSION {
            return Err(ArchiveError::VersionMismatch {
                found: metadata.format_version,
                expected: ARCHIVE_FORMAT_VERSION.to_string(),
            });
        }
        let data: ArchiveData = read_json(root, DATA_FILE)?;
        Ok(Self {
            root: root.to_path_buf(),
            metadata,
            data,
        })
    }

    /// The archive's schema metadata.
    #[must_use]
    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    /// The archive's record data.
    #[must_use]
    pub fn data(&self) -> &ArchiveData {
        &self.data
    }

    /// The export rows of one entity kind, if any were exported.
    #[must_use]
    pub fn rows(&self, kind_name: &str) -> Option<&BTreeMap<String, Map<String, Value>>> {
        self.data.export_data.get(kind_name)
    }

    /// The in-archive payload directory for a node UUID (whether or not
    /// it exists; existence is the importer's concern).
    #[must_use]
    pub fn payload_dir(&self, uuid: &EntityUuid) -> PathBuf {
        self.root.join(PAYLOADS_DIR).join(shard_path(uuid))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(root: &Path, name: &str) -> ArchiveResult<T> {
    let path = root.join(name);
    let raw = fs::read_to_string(&path)
        .map_err(|e| ArchiveError::Corrupt(format!("cannot read {name}: {e}")))?;
    serde_json::from_str(&raw).map_err(|e| ArchiveError::Corrupt(format!("{name}: {e}")))
}
