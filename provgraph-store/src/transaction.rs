use crate::error::{StoreError, StoreResult};
use crate::schema::{key_column, table};
use chrono::{DateTime, Utc};
use provgraph_model::{Comment, Computer, EntityKind, Group, LinkType, Log, Node, User};
use provgraph_types::StoreId;
use rusqlite::{params, params_from_iter, OptionalExtension, Transaction};
use serde_json::{Map, Value};
use tracing::debug;

/// Upper bound on bind parameters per set-membership query, below the
/// SQLite default variable limit.
const MAX_SET_QUERY_PARAMS: usize = 500;

/// One transaction against a [`crate::ProvStore`].
///
/// Rows inserted here are queryable by every later call on the same
/// handle, but invisible outside it until [`commit`](Self::commit).
/// Dropping the handle rolls back all writes.
pub struct StoreTransaction<'a> {
    tx: Transaction<'a>,
}

impl<'a> StoreTransaction<'a> {
    pub(crate) fn new(tx: Transaction<'a>) -> Self {
        Self { tx }
    }

    /// Commits all writes made through this handle.
    pub fn commit(self) -> StoreResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    // ── Bulk natural-key resolution ──────────────────────────────

    /// Resolves natural keys to store ids in one set-membership query
    /// per chunk. Keys absent from the store are simply not returned.
    pub fn ids_by_natural_key(
        &self,
        kind: EntityKind,
        keys: &[String],
    ) -> StoreResult<Vec<(String, StoreId)>> {
        let mut out = Vec::new();
        for chunk in keys.chunks(MAX_SET_QUERY_PARAMS) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {key}, id FROM {table} WHERE {key} IN ({placeholders})",
                key = key_column(kind),
                table = table(kind),
            );
            let mut stmt = self.tx.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (key, id) = row?;
                out.push((key, StoreId::new(id)));
            }
        }
        Ok(out)
    }

    /// Number of rows of a kind. Mostly useful to tests and reporting.
    pub fn entity_count(&self, kind: EntityKind) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table(kind));
        Ok(self.tx.query_row(&sql, [], |row| row.get(0))?)
    }

    // ── Inserts ──────────────────────────────────────────────────

    /// Inserts a user row.
    pub fn insert_user(&self, user: &User) -> StoreResult<StoreId> {
        self.tx.execute(
            "INSERT INTO users (email, first_name, last_name, institution) VALUES (?1, ?2, ?3, ?4)",
            params![user.email, user.first_name, user.last_name, user.institution],
        )?;
        Ok(StoreId::new(self.tx.last_insert_rowid()))
    }

    /// Inserts a computer row.
    pub fn insert_computer(&self, computer: &Computer) -> StoreResult<StoreId> {
        self.tx.execute(
            "INSERT INTO computers (uuid, name, hostname, description, scheduler_type, transport_type, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                computer.uuid.canonical(),
                computer.name,
                computer.hostname,
                computer.description,
                computer.scheduler_type,
                computer.transport_type,
                serde_json::to_string(&computer.metadata)?,
            ],
        )?;
        Ok(StoreId::new(self.tx.last_insert_rowid()))
    }

    /// Inserts a node row.
    pub fn insert_node(&self, node: &Node) -> StoreResult<StoreId> {
        self.tx.execute(
            "INSERT INTO nodes (uuid, node_type, process_type, label, description, ctime, mtime,
                                user_id, computer_id, attributes, extras)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                node.uuid.canonical(),
                node.node_type,
                node.process_type,
                node.label,
                node.description,
                node.ctime.to_rfc3339(),
                node.mtime.to_rfc3339(),
                node.user_id.get(),
                node.computer_id.map(|id| id.get()),
                serde_json::to_string(&node.attributes)?,
                serde_json::to_string(&node.extras)?,
            ],
        )?;
        Ok(StoreId::new(self.tx.last_insert_rowid()))
    }

    /// Inserts a group row.
    pub fn insert_group(&self, group: &Group) -> StoreResult<StoreId> {
        self.tx.execute(
            "INSERT INTO node_groups (uuid, label, group_type, description, time, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                group.uuid.canonical(),
                group.label,
                group.group_type,
                group.description,
                group.time.to_rfc3339(),
                group.user_id.get(),
            ],
        )?;
        Ok(StoreId::new(self.tx.last_insert_rowid()))
    }

    /// Inserts a log row.
    pub fn insert_log(&self, log: &Log) -> StoreResult<StoreId> {
        self.tx.execute(
            "INSERT INTO logs (uuid, time, logger_name, level_name, node_id, message, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.uuid.canonical(),
                log.time.to_rfc3339(),
                log.logger_name,
                log.level_name,
                log.node_id.get(),
                log.message,
                serde_json::to_string(&log.metadata)?,
            ],
        )?;
        Ok(StoreId::new(self.tx.last_insert_rowid()))
    }

    /// Inserts a comment row.
    pub fn insert_comment(&self, comment: &Comment) -> StoreResult<StoreId> {
        self.tx.execute(
            "INSERT INTO comments (uuid, ctime, mtime, node_id, user_id, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                comment.uuid.canonical(),
                comment.ctime.to_rfc3339(),
                comment.mtime.to_rfc3339(),
                comment.node_id.get(),
                comment.user_id.get(),
                comment.content,
            ],
        )?;
        Ok(StoreId::new(self.tx.last_insert_rowid()))
    }

    // ── Uniqueness probes ────────────────────────────────────────

    /// Whether a computer with this name exists.
    pub fn computer_name_exists(&self, name: &str) -> StoreResult<bool> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM computers WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether a group with this label exists.
    pub fn group_label_exists(&self, label: &str) -> StoreResult<bool> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM node_groups WHERE label = ?1",
            params![label],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Node extras ──────────────────────────────────────────────

    /// Reads a node's extras map.
    pub fn node_extras(&self, id: StoreId) -> StoreResult<Map<String, Value>> {
        let raw: String = self
            .tx
            .query_row(
                "SELECT extras FROM nodes WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("node id {id}")))?;
        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::InvalidData(format!(
                "extras of node {id} is not a JSON object"
            ))),
        }
    }

    /// Replaces a node's extras map.
    pub fn update_node_extras(&self, id: StoreId, extras: &Map<String, Value>) -> StoreResult<()> {
        let changed = self.tx.execute(
            "UPDATE nodes SET extras = ?1 WHERE id = ?2",
            params![serde_json::to_string(extras)?, id.get()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("node id {id}")));
        }
        debug!("updated extras of node {id}");
        Ok(())
    }

    /// Reads the id of a node's owning user.
    pub fn node_user(&self, id: StoreId) -> StoreResult<StoreId> {
        self.tx
            .query_row(
                "SELECT user_id FROM nodes WHERE id = ?1",
                params![id.get()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(StoreId::new)
            .ok_or_else(|| StoreError::NotFound(format!("node id {id}")))
    }

    /// Reads a node's dotted type tag.
    pub fn node_type(&self, id: StoreId) -> StoreResult<String> {
        self.tx
            .query_row(
                "SELECT node_type FROM nodes WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("node id {id}")))
    }

    // ── Comments ─────────────────────────────────────────────────

    /// Looks up a comment by UUID, returning its id, modification time,
    /// and content.
    pub fn comment_by_uuid(
        &self,
        uuid: &str,
    ) -> StoreResult<Option<(StoreId, DateTime<Utc>, String)>> {
        let row = self
            .tx
            .query_row(
                "SELECT id, mtime, content FROM comments WHERE uuid = ?1",
                params![uuid],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, mtime, content)) => {
                Ok(Some((StoreId::new(id), parse_timestamp(&mtime)?, content)))
            }
            None => Ok(None),
        }
    }

    /// Overwrites a comment's content and modification time.
    pub fn update_comment(
        &self,
        id: StoreId,
        content: &str,
        mtime: DateTime<Utc>,
    ) -> StoreResult<()> {
        let changed = self.tx.execute(
            "UPDATE comments SET content = ?1, mtime = ?2 WHERE id = ?3",
            params![content, mtime.to_rfc3339(), id.get()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("comment id {id}")));
        }
        Ok(())
    }

    // ── Links ────────────────────────────────────────────────────

    /// Whether the exact link quadruple exists.
    pub fn link_exists(
        &self,
        source: StoreId,
        target: StoreId,
        link_type: LinkType,
        label: &str,
    ) -> StoreResult<bool> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM links
             WHERE source_id = ?1 AND target_id = ?2 AND link_type = ?3 AND label = ?4",
            params![source.get(), target.get(), link_type.as_str(), label],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// The types of links already connecting an ordered pair under a
    /// given label.
    pub fn link_types_for_labeled_pair(
        &self,
        source: StoreId,
        target: StoreId,
        label: &str,
    ) -> StoreResult<Vec<String>> {
        let mut stmt = self.tx.prepare(
            "SELECT link_type FROM links
             WHERE source_id = ?1 AND target_id = ?2 AND label = ?3",
        )?;
        let rows = stmt.query_map(params![source.get(), target.get(), label], |row| {
            row.get::<_, String>(0)
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Inserts a link.
    pub fn insert_link(
        &self,
        source: StoreId,
        target: StoreId,
        link_type: LinkType,
        label: &str,
    ) -> StoreResult<()> {
        self.tx.execute(
            "INSERT INTO links (source_id, target_id, link_type, label) VALUES (?1, ?2, ?3, ?4)",
            params![source.get(), target.get(), link_type.as_str(), label],
        )?;
        Ok(())
    }

    /// Total number of links.
    pub fn link_count(&self) -> StoreResult<i64> {
        Ok(self
            .tx
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?)
    }

    // ── Groups & membership ──────────────────────────────────────

    /// Looks up a group id by UUID.
    pub fn group_id_by_uuid(&self, uuid: &str) -> StoreResult<Option<StoreId>> {
        let id = self
            .tx
            .query_row(
                "SELECT id FROM node_groups WHERE uuid = ?1",
                params![uuid],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(StoreId::new))
    }

    /// Looks up a group id by label.
    pub fn group_id_by_label(&self, label: &str) -> StoreResult<Option<StoreId>> {
        let id = self
            .tx
            .query_row(
                "SELECT id FROM node_groups WHERE label = ?1",
                params![label],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(StoreId::new))
    }

    /// Adds nodes to a group. Existing memberships are left untouched.
    pub fn add_nodes_to_group(&self, group: StoreId, node_ids: &[StoreId]) -> StoreResult<()> {
        let mut stmt = self
            .tx
            .prepare("INSERT OR IGNORE INTO group_nodes (group_id, node_id) VALUES (?1, ?2)")?;
        for node_id in node_ids {
            stmt.execute(params![group.get(), node_id.get()])?;
        }
        Ok(())
    }

    /// The node ids belonging to a group.
    pub fn nodes_in_group(&self, group: StoreId) -> StoreResult<Vec<StoreId>> {
        let mut stmt = self
            .tx
            .prepare("SELECT node_id FROM group_nodes WHERE group_id = ?1 ORDER BY node_id")?;
        let rows = stmt.query_map(params![group.get()], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(StoreId::new(row?));
        }
        Ok(out)
    }

    /// Total number of group memberships.
    pub fn membership_count(&self) -> StoreResult<i64> {
        Ok(self
            .tx
            .query_row("SELECT COUNT(*) FROM group_nodes", [], |row| row.get(0))?)
    }
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("bad timestamp '{raw}': {e}")))
}
