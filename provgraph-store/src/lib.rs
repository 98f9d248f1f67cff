//! SQLite-backed entity store for ProvGraph.
//!
//! Persists the provenance graph — users, computers, nodes, groups,
//! logs, comments, and typed links — in a single SQLite database with
//! the uniqueness constraints the import machinery relies on (unique
//! email, computer name, entity UUIDs, group label, link quadruple).
//!
//! All record mutation flows through an explicit [`StoreTransaction`]:
//! rows inserted inside one are immediately queryable within it (the
//! flush boundary dependent lookups need), and nothing is visible to
//! other connections until [`StoreTransaction::commit`]. Dropping the
//! transaction without committing rolls back every write.

mod error;
mod schema;
mod store;
mod transaction;

pub use error::{StoreError, StoreResult};
pub use store::ProvStore;
pub use transaction::StoreTransaction;
