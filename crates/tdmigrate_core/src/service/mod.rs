//! Migration phase services.
//!
//! # Responsibility
//! - Implement each migration phase as a function over in-memory records.
//! - Compose the phases into one barriered run (`pipeline`).
//!
//! # Invariants
//! - Phases never touch the record source directly; only `pipeline` does.
//! - Indices are built once per run and only read afterwards.

pub mod attendance_resolver;
pub mod dedup;
pub mod person_normalizer;
pub mod pipeline;
pub mod role_catalog;
pub mod sponsor_linker;
pub mod table_catalog;
pub mod weekend_roster;
