//! Entity model for ProvGraph.
//!
//! Defines what the store and the import machinery agree on:
//!
//! - **Entity kinds** and the canonical processing order derived from
//!   their foreign-key dependencies
//! - **Typed rows** for each kind, as they live in a store
//! - **Link semantics**: link types, node categories, and the rules that
//!   decide which categories a link type may connect
//!
//! The model is storage-agnostic; persistence lives in `provgraph-store`.

mod entity;
mod kind;
mod link;

pub use entity::{
    node_type_is_code, Comment, Computer, Group, Log, Node, User, CODE_TYPE_SUFFIX,
    HIDDEN_EXTRA_KEY, IMPORT_GROUP_TYPE, RESERVED_EXTRA_PREFIX,
};
pub use kind::EntityKind;
pub use link::{LinkType, NodeCategory};
