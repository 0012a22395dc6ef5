//! Migrated entity model.
//!
//! # Responsibility
//! - Define the canonical entities written to the target store.
//! - Keep transient migration-only state out of the serialized shape.
//!
//! # Invariants
//! - Every entity is identified by a stable `EntityId`.
//! - Migration keys never appear in serialized output.

pub mod person;
pub mod role;
pub mod table;
pub mod weekend;
