//! Caller configuration for an import.

use serde::{Deserialize, Serialize};

/// What to do when a link or group membership references a node that
/// cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownNodePolicy {
    /// Abort the import.
    #[default]
    Fail,
    /// Silently skip the reference.
    Ignore,
}

/// Disposition of extras keys present only on the stored node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingExtras {
    /// Keep the stored value (`k`).
    Keep,
    /// Drop the key (`n`).
    Discard,
}

/// Disposition of extras keys present only in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingExtras {
    /// Create the key (`c`).
    Create,
    /// Drop the key (`n`).
    Ignore,
}

/// Resolution for a key present on both sides with differing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Leave the stored value (`l`).
    KeepExisting,
    /// Take the archived value (`u`).
    TakeIncoming,
    /// Delete the key entirely (`d`).
    Delete,
    /// Leave the stored value and flag the key for manual resolution
    /// (`a`).
    Defer,
}

/// The three-part policy applied when merging extras of a node that
/// already exists in the store.
///
/// The compact code form mirrors the positional letters documented on
/// each variant: `kcl` is (Keep, Create, KeepExisting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtrasMergePolicy {
    pub existing: ExistingExtras,
    pub incoming: IncomingExtras,
    pub conflict: ConflictResolution,
}

impl ExtrasMergePolicy {
    /// Parses a three-letter code such as `kcl` or `knu`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let existing = match chars.next()? {
            'k' => ExistingExtras::Keep,
            'n' => ExistingExtras::Discard,
            _ => return None,
        };
        let incoming = match chars.next()? {
            'c' => IncomingExtras::Create,
            'n' => IncomingExtras::Ignore,
            _ => return None,
        };
        let conflict = match chars.next()? {
            'l' => ConflictResolution::KeepExisting,
            'u' => ConflictResolution::TakeIncoming,
            'd' => ConflictResolution::Delete,
            'a' => ConflictResolution::Defer,
            _ => return None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self {
            existing,
            incoming,
            conflict,
        })
    }

    /// The three-letter code form of this policy.
    #[must_use]
    pub fn code(&self) -> String {
        let mut code = String::with_capacity(3);
        code.push(match self.existing {
            ExistingExtras::Keep => 'k',
            ExistingExtras::Discard => 'n',
        });
        code.push(match self.incoming {
            IncomingExtras::Create => 'c',
            IncomingExtras::Ignore => 'n',
        });
        code.push(match self.conflict {
            ConflictResolution::KeepExisting => 'l',
            ConflictResolution::TakeIncoming => 'u',
            ConflictResolution::Delete => 'd',
            ConflictResolution::Defer => 'a',
        });
        code
    }
}

impl Default for ExtrasMergePolicy {
    fn default() -> Self {
        Self {
            existing: ExistingExtras::Keep,
            incoming: IncomingExtras::Create,
            conflict: ConflictResolution::KeepExisting,
        }
    }
}

/// Whether extras of newly created nodes are imported at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewExtrasPolicy {
    /// Import archived extras (minus reserved keys).
    #[default]
    Import,
    /// Start new nodes with empty extras.
    Skip,
}

/// How an archived comment is merged into an existing comment with the
/// same UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentMergePolicy {
    /// Keep whichever side was modified last; a newer incoming comment
    /// with different content is re-keyed and created alongside.
    #[default]
    KeepNewest,
    /// Always overwrite the stored comment with the archived one.
    Overwrite,
}

/// Caller configuration for one import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Label of the group all imported nodes are attached to. `None`
    /// synthesizes a timestamp-labeled group.
    pub destination_group: Option<String>,
    pub unknown_nodes: UnknownNodePolicy,
    pub extras_existing: ExtrasMergePolicy,
    pub extras_new: NewExtrasPolicy,
    pub comments: CommentMergePolicy,
}
