//! Materialization of typed store rows from archive field maps.
//!
//! Archive rows are flat JSON maps; foreign-key fields carry the
//! archive id of the referenced record and are remapped to store ids
//! through the [`IdentityResolver`]. Every missing or malformed field
//! is a [`ImportError::CorruptArchive`] naming the record.

use crate::error::{ImportError, ImportResult};
use crate::identity::IdentityResolver;
use chrono::{DateTime, Utc};
use provgraph_model::{Comment, Computer, EntityKind, Group, Log, Node, User};
use provgraph_types::{ArchiveId, EntityUuid};
use serde_json::{Map, Value};

fn req_str(row: &Map<String, Value>, field: &str, context: &str) -> ImportResult<String> {
    match row.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ImportError::CorruptArchive(format!(
            "{context}: field '{field}' is not a string ({other})"
        ))),
        None => Err(ImportError::CorruptArchive(format!(
            "{context}: missing field '{field}'"
        ))),
    }
}

fn opt_str(row: &Map<String, Value>, field: &str) -> Option<String> {
    match row.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn req_uuid(row: &Map<String, Value>, field: &str, context: &str) -> ImportResult<EntityUuid> {
    let raw = req_str(row, field, context)?;
    EntityUuid::parse(&raw)
        .map_err(|_| ImportError::CorruptArchive(format!("{context}: invalid UUID '{raw}'")))
}

fn req_time(row: &Map<String, Value>, field: &str, context: &str) -> ImportResult<DateTime<Utc>> {
    let raw = req_str(row, field, context)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ImportError::CorruptArchive(format!("{context}: bad timestamp '{raw}': {e}"))
        })
}

fn fk_from_value(value: &Value) -> Option<ArchiveId> {
    match value {
        Value::Number(n) => n.as_i64().map(ArchiveId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn req_fk(row: &Map<String, Value>, field: &str, context: &str) -> ImportResult<ArchiveId> {
    let value = row.get(field).ok_or_else(|| {
        ImportError::CorruptArchive(format!("{context}: missing field '{field}'"))
    })?;
    fk_from_value(value).ok_or_else(|| {
        ImportError::CorruptArchive(format!(
            "{context}: field '{field}' is not an archive id ({value})"
        ))
    })
}

fn opt_fk(row: &Map<String, Value>, field: &str, context: &str) -> ImportResult<Option<ArchiveId>> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => fk_from_value(value).map(Some).ok_or_else(|| {
            ImportError::CorruptArchive(format!(
                "{context}: field '{field}' is not an archive id ({value})"
            ))
        }),
    }
}

/// Arbitrary JSON metadata. Exporters that serialize such fields as
/// strings of JSON are tolerated by parsing one level deep.
fn json_metadata(row: &Map<String, Value>, field: &str) -> Value {
    match row.get(field) {
        Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or(Value::Null),
        Some(value) => value.clone(),
        None => Value::Null,
    }
}

/// Builds a user row.
pub fn build_user(row: &Map<String, Value>, archive_id: ArchiveId) -> ImportResult<User> {
    let context = format!("User {archive_id}");
    Ok(User {
        email: req_str(row, "email", &context)?,
        first_name: opt_str(row, "first_name").unwrap_or_default(),
        last_name: opt_str(row, "last_name").unwrap_or_default(),
        institution: opt_str(row, "institution").unwrap_or_default(),
    })
}

/// The name an archived computer asks for, before deduplication.
pub fn computer_name(row: &Map<String, Value>, archive_id: ArchiveId) -> ImportResult<String> {
    req_str(row, "name", &format!("Computer {archive_id}"))
}

/// The label an archived group asks for, before deduplication.
pub fn group_label(row: &Map<String, Value>, archive_id: ArchiveId) -> ImportResult<String> {
    req_str(row, "label", &format!("Group {archive_id}"))
}

/// Builds a computer row. `name` is passed separately because the
/// deduplication engine may have renamed it.
pub fn build_computer(
    row: &Map<String, Value>,
    archive_id: ArchiveId,
    name: String,
) -> ImportResult<Computer> {
    let context = format!("Computer {archive_id}");
    Ok(Computer {
        uuid: req_uuid(row, "uuid", &context)?,
        name,
        hostname: opt_str(row, "hostname").unwrap_or_default(),
        description: opt_str(row, "description").unwrap_or_default(),
        scheduler_type: opt_str(row, "scheduler_type").unwrap_or_default(),
        transport_type: opt_str(row, "transport_type").unwrap_or_default(),
        metadata: json_metadata(row, "metadata"),
    })
}

/// Builds a node row with empty attributes and extras; the pipeline
/// fills both from the archive's side tables.
pub fn build_node(
    row: &Map<String, Value>,
    archive_id: ArchiveId,
    resolver: &IdentityResolver,
) -> ImportResult<Node> {
    let context = format!("Node {archive_id}");
    let user_fk = req_fk(row, "user", &context)?;
    let user_id = resolver.resolve_foreign(EntityKind::User, user_fk, &context)?;
    let computer_id = match opt_fk(row, "computer", &context)? {
        Some(fk) => Some(resolver.resolve_foreign(EntityKind::Computer, fk, &context)?),
        None => None,
    };
    Ok(Node {
        uuid: req_uuid(row, "uuid", &context)?,
        node_type: req_str(row, "node_type", &context)?,
        process_type: opt_str(row, "process_type"),
        label: opt_str(row, "label").unwrap_or_default(),
        description: opt_str(row, "description").unwrap_or_default(),
        ctime: req_time(row, "ctime", &context)?,
        mtime: req_time(row, "mtime", &context)?,
        user_id,
        computer_id,
        attributes: Map::new(),
        extras: Map::new(),
    })
}

/// Builds a group row. `label` is passed separately because the
/// deduplication engine may have renamed it.
pub fn build_group(
    row: &Map<String, Value>,
    archive_id: ArchiveId,
    resolver: &IdentityResolver,
    label: String,
) -> ImportResult<Group> {
    let context = format!("Group {archive_id}");
    let user_fk = req_fk(row, "user", &context)?;
    Ok(Group {
        uuid: req_uuid(row, "uuid", &context)?,
        label,
        group_type: opt_str(row, "group_type").unwrap_or_default(),
        description: opt_str(row, "description").unwrap_or_default(),
        time: req_time(row, "time", &context)?,
        user_id: resolver.resolve_foreign(EntityKind::User, user_fk, &context)?,
    })
}

/// Builds a log row.
pub fn build_log(
    row: &Map<String, Value>,
    archive_id: ArchiveId,
    resolver: &IdentityResolver,
) -> ImportResult<Log> {
    let context = format!("Log {archive_id}");
    let node_fk = req_fk(row, "node", &context)?;
    Ok(Log {
        uuid: req_uuid(row, "uuid", &context)?,
        time: req_time(row, "time", &context)?,
        logger_name: opt_str(row, "logger_name").unwrap_or_default(),
        level_name: opt_str(row, "level_name").unwrap_or_default(),
        node_id: resolver.resolve_foreign(EntityKind::Node, node_fk, &context)?,
        message: opt_str(row, "message").unwrap_or_default(),
        metadata: json_metadata(row, "metadata"),
    })
}

/// Builds a comment row.
pub fn build_comment(
    row: &Map<String, Value>,
    archive_id: ArchiveId,
    resolver: &IdentityResolver,
) -> ImportResult<Comment> {
    let context = format!("Comment {archive_id}");
    let node_fk = req_fk(row, "node", &context)?;
    let user_fk = req_fk(row, "user", &context)?;
    Ok(Comment {
        uuid: req_uuid(row, "uuid", &context)?,
        ctime: req_time(row, "ctime", &context)?,
        mtime: req_time(row, "mtime", &context)?,
        node_id: resolver.resolve_foreign(EntityKind::Node, node_fk, &context)?,
        user_id: resolver.resolve_foreign(EntityKind::User, user_fk, &context)?,
        content: opt_str(row, "content").unwrap_or_default(),
    })
}

/// Reads the incoming modification time and content of an archived
/// comment, for the merge decision.
pub fn comment_merge_inputs(
    row: &Map<String, Value>,
    archive_id: ArchiveId,
) -> ImportResult<(DateTime<Utc>, String)> {
    let context = format!("Comment {archive_id}");
    Ok((
        req_time(row, "mtime", &context)?,
        opt_str(row, "content").unwrap_or_default(),
    ))
}
