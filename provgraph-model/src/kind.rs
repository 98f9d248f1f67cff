use serde::{Deserialize, Serialize};
use std::fmt;

/// The entity kinds a store holds, in no particular order.
///
/// The processing order for imports is [`EntityKind::canonical_order`]:
/// a kind whose rows carry a foreign key to another kind must come
/// strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Computer,
    Node,
    Group,
    Log,
    Comment,
}

impl EntityKind {
    /// The canonical processing order: referenced kinds before
    /// referencing kinds (User before Node, Node before Log, ...).
    pub const fn canonical_order() -> [EntityKind; 6] {
        [
            EntityKind::User,
            EntityKind::Computer,
            EntityKind::Node,
            EntityKind::Group,
            EntityKind::Log,
            EntityKind::Comment,
        ]
    }

    /// The kind name as it appears in archive metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Computer => "Computer",
            EntityKind::Node => "Node",
            EntityKind::Group => "Group",
            EntityKind::Log => "Log",
            EntityKind::Comment => "Comment",
        }
    }

    /// Parses a kind name from archive metadata. Returns `None` for a
    /// name outside the canonical list.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "User" => Some(EntityKind::User),
            "Computer" => Some(EntityKind::Computer),
            "Node" => Some(EntityKind::Node),
            "Group" => Some(EntityKind::Group),
            "Log" => Some(EntityKind::Log),
            "Comment" => Some(EntityKind::Comment),
            _ => None,
        }
    }

    /// The field holding the kind's natural unique key.
    ///
    /// Users are identified by email across stores; every other kind by
    /// its UUID.
    #[must_use]
    pub const fn natural_key_field(&self) -> &'static str {
        match self {
            EntityKind::User => "email",
            _ => "uuid",
        }
    }

    /// Whether the natural key is a UUID (and must be normalized to the
    /// canonical textual form before any lookup).
    #[must_use]
    pub const fn natural_key_is_uuid(&self) -> bool {
        !matches!(self, EntityKind::User)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
