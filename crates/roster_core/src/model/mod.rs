//! Domain model for the roster store.
//!
//! # Responsibility
//! - Define the snapshot records handed out by the store.
//! - Define the opaque references used to address entities across scopes.
//!
//! # Invariants
//! - Records are plain values; mutating one never changes stored state.
//! - Cross-scope handoff always goes through an id, never a record.

pub mod group;
pub mod todo;
