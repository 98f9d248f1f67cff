use crate::error::StoreResult;
use crate::schema::init_schema;
use crate::transaction::StoreTransaction;
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

/// A SQLite-backed provenance store.
///
/// One instance owns one connection. Imports hold one transaction for
/// their whole lifetime; see [`StoreTransaction`].
pub struct ProvStore {
    conn: Connection,
}

impl ProvStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        debug!("opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Begins a transaction.
    ///
    /// All writes go through the returned handle; dropping it without
    /// calling [`StoreTransaction::commit`] rolls them back.
    pub fn transaction(&mut self) -> StoreResult<StoreTransaction<'_>> {
        Ok(StoreTransaction::new(self.conn.transaction()?))
    }
}
