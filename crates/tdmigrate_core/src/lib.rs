//! Core migration engine for legacy Tres Dias roster extracts.
//! Turns household, experience and role rows into a linked entity graph.

pub mod config;
pub mod identity;
pub mod logging;
pub mod model;
pub mod service;
pub mod source;

pub use config::{ConfigError, MigrationConfig, TableNames, DEFAULT_COMMUNITY};
pub use identity::{EntityId, IdentityAllocator, RandomIdAllocator, SequentialIdAllocator};
pub use logging::{
    default_log_level, init_console_logging, init_logging, logging_status, LogTarget,
};
pub use model::person::{
    EmailAddress, ExperienceEntry, Gender, MigrationKey, Person, PersonStatus, PersonSummary,
    PhoneNumber, PostalAddress,
};
pub use model::role::{Role, CANDIDATE_ROLE_TITLE};
pub use model::table::SeatingTable;
pub use model::weekend::{Attendance, AttendanceLink, PendingLink, ResolvedLink, Weekend, WeekendKey};
pub use service::attendance_resolver::{ReferenceKind, UnresolvedReference};
pub use service::pipeline::{
    MigrationError, MigrationGraph, MigrationOutcome, MigrationReport, MigrationService,
};
pub use source::{
    fetch_tables, MemoryRecordSource, RawRow, RawValue, RecordSource, SourceError,
    SourceResult, SourceTables, SqliteRecordSource,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
