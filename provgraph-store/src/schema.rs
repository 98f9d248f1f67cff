//! Relational schema for the provenance graph.

use crate::error::StoreResult;
use provgraph_model::EntityKind;
use rusqlite::Connection;

/// The table holding rows of a given entity kind.
pub(crate) const fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Computer => "computers",
        EntityKind::Node => "nodes",
        EntityKind::Group => "node_groups",
        EntityKind::Log => "logs",
        EntityKind::Comment => "comments",
    }
}

/// The column holding a kind's natural unique key.
pub(crate) const fn key_column(kind: EntityKind) -> &'static str {
    kind.natural_key_field()
}

pub(crate) fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            institution TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS computers (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL UNIQUE,
            hostname TEXT NOT NULL,
            description TEXT NOT NULL,
            scheduler_type TEXT NOT NULL,
            transport_type TEXT NOT NULL,
            metadata TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS nodes (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            node_type TEXT NOT NULL,
            process_type TEXT,
            label TEXT NOT NULL,
            description TEXT NOT NULL,
            ctime TEXT NOT NULL,
            mtime TEXT NOT NULL,
            user_id INTEGER NOT NULL REFERENCES users(id),
            computer_id INTEGER REFERENCES computers(id),
            attributes TEXT NOT NULL,
            extras TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS node_groups (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            label TEXT NOT NULL UNIQUE,
            group_type TEXT NOT NULL,
            description TEXT NOT NULL,
            time TEXT NOT NULL,
            user_id INTEGER NOT NULL REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS group_nodes (
            group_id INTEGER NOT NULL REFERENCES node_groups(id),
            node_id INTEGER NOT NULL REFERENCES nodes(id),
            UNIQUE(group_id, node_id)
        );

        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            time TEXT NOT NULL,
            logger_name TEXT NOT NULL,
            level_name TEXT NOT NULL,
            node_id INTEGER NOT NULL REFERENCES nodes(id),
            message TEXT NOT NULL,
            metadata TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            ctime TEXT NOT NULL,
            mtime TEXT NOT NULL,
            node_id INTEGER NOT NULL REFERENCES nodes(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            content TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS links (
            id INTEGER PRIMARY KEY,
            source_id INTEGER NOT NULL REFERENCES nodes(id),
            target_id INTEGER NOT NULL REFERENCES nodes(id),
            link_type TEXT NOT NULL,
            label TEXT NOT NULL,
            UNIQUE(source_id, target_id, link_type, label)
        );

        CREATE INDEX IF NOT EXISTS idx_links_pair ON links(source_id, target_id);
        CREATE INDEX IF NOT EXISTS idx_logs_node ON logs(node_id);
        CREATE INDEX IF NOT EXISTS idx_comments_node ON comments(node_id);
        ",
    )?;
    Ok(())
}
