//! End-to-end migration run.
//!
//! # Responsibility
//! - Fetch every configured table, then run the phases in a fixed order.
//! - Return the normalized graph together with a run report.
//!
//! # Invariants
//! - No phase starts before the previous one has finished.
//! - A source failure aborts the run before any record is produced.
//! - The returned graph carries no migration keys or pending stubs.

use crate::config::{ConfigError, MigrationConfig};
use crate::identity::IdentityAllocator;
use crate::model::person::{Gender, Person};
use crate::model::role::Role;
use crate::model::table::SeatingTable;
use crate::model::weekend::Weekend;
use crate::service::attendance_resolver::{resolve_attendance, UnresolvedReference};
use crate::service::dedup::deduplicate;
use crate::service::person_normalizer::PersonNormalizer;
use crate::service::role_catalog::RoleCatalog;
use crate::service::sponsor_linker::link_sponsors;
use crate::service::table_catalog::build_table_catalog;
use crate::service::weekend_roster::{build_roster, enroll_candidates, WeekendBook};
use crate::source::{fetch_tables, RecordSource, SourceError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Fatal migration failure.
#[derive(Debug)]
pub enum MigrationError {
    Config(ConfigError),
    Source(SourceError),
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Source(err) => write!(f, "source read failed: {err}"),
        }
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Source(err) => Some(err),
        }
    }
}

impl From<ConfigError> for MigrationError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SourceError> for MigrationError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

/// Normalized entity collections produced by one run.
#[derive(Debug, Clone)]
pub struct MigrationGraph {
    pub people: Vec<Person>,
    /// Male weekends first, then female, each in creation order.
    pub weekends: Vec<Weekend>,
    /// Catalog roles followed by the synthetic Candidate role.
    pub roles: Vec<Role>,
    pub tables: Vec<SeatingTable>,
}

/// Counts and diagnostics from one run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub active_rows: usize,
    pub archived_rows: usize,
    /// Person records before deduplication.
    pub people_parsed: usize,
    pub people_merged: usize,
    pub spouse_links_dropped: usize,
    pub staff_stubs: usize,
    /// Experience rows skipped for lacking a weekend number.
    pub staff_rows_skipped: usize,
    pub candidates_enrolled: usize,
    pub sponsors_linked: usize,
    pub attendances_resolved: usize,
    pub attendances_dropped: usize,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Graph plus report.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub graph: MigrationGraph,
    pub report: MigrationReport,
}

/// Runs a configured migration against any record source.
#[derive(Debug, Clone)]
pub struct MigrationService {
    config: MigrationConfig,
}

impl MigrationService {
    /// Creates a service after validating `config`.
    pub fn new(config: MigrationConfig) -> Result<Self, MigrationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Runs every phase and returns the finished graph.
    ///
    /// # Errors
    /// - `Source` when any configured table cannot be fetched.
    pub fn run<S>(
        &self,
        source: &S,
        ids: &mut dyn IdentityAllocator,
    ) -> Result<MigrationOutcome, MigrationError>
    where
        S: RecordSource + Sync + ?Sized,
    {
        let started_at = Instant::now();
        let tables = &self.config.tables;
        info!(
            "event=migration_run module=pipeline status=start community={}",
            self.config.community
        );

        let fetched = fetch_tables(source, &tables.all()).map_err(|err| {
            error!(
                "event=migration_run module=pipeline status=error phase=fetch duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            MigrationError::from(err)
        })?;

        let mut report = MigrationReport::default();

        let active_rows = fetched.rows(&tables.people);
        report.active_rows = active_rows.len();
        let mut people = PersonNormalizer::new().normalize_rows(active_rows, ids);
        if let Some(archived) = tables.archived_people.as_deref() {
            let archived_rows = fetched.rows(archived);
            report.archived_rows = archived_rows.len();
            people.extend(
                PersonNormalizer::with_status_override(self.config.archived_status)
                    .normalize_rows(archived_rows, ids),
            );
        }
        report.people_parsed = people.len();
        info!(
            "event=migration_phase module=pipeline status=ok phase=normalize active_rows={} archived_rows={} people={}",
            report.active_rows, report.archived_rows, report.people_parsed
        );

        let dedup = deduplicate(people);
        report.people_merged = dedup.merged;
        report.spouse_links_dropped = dedup.spouse_links_dropped;
        let index = dedup.index;
        let mut people = dedup.people;

        let roles = RoleCatalog::build(fetched.rows(&tables.roles), ids);
        let seating_tables = build_table_catalog(fetched.rows(&tables.table_names), ids);

        let mut book = WeekendBook::new(self.config.community.as_str());
        for (gender, table) in [
            (Gender::Male, tables.male_experience.as_str()),
            (Gender::Female, tables.female_experience.as_str()),
        ] {
            let roster = build_roster(&mut book, gender, fetched.rows(table), ids);
            report.staff_stubs += roster.stubs;
            report.staff_rows_skipped += roster.dropped;
        }

        report.candidates_enrolled =
            enroll_candidates(&mut book, &people, roles.candidate_role(), ids);
        report.sponsors_linked = link_sponsors(&mut people, &index).linked;

        let resolution = resolve_attendance(&mut book, &mut people, &index, &roles);
        report.attendances_resolved = resolution.resolved;
        report.attendances_dropped = resolution.dropped;
        report.unresolved = resolution.unresolved;

        for person in &mut people {
            person.clear_transient();
        }

        let graph = MigrationGraph {
            people,
            weekends: book.into_weekends(),
            roles: roles.into_roles(),
            tables: seating_tables,
        };

        info!(
            "event=migration_run module=pipeline status=ok duration_ms={} people={} weekends={} roles={} tables={} unresolved={}",
            started_at.elapsed().as_millis(),
            graph.people.len(),
            graph.weekends.len(),
            graph.roles.len(),
            graph.tables.len(),
            report.unresolved.len()
        );

        Ok(MigrationOutcome { graph, report })
    }
}

#[cfg(test)]
mod tests {
    use super::{MigrationError, MigrationService};
    use crate::config::{ConfigError, MigrationConfig};
    use crate::identity::SequentialIdAllocator;
    use crate::source::{MemoryRecordSource, SourceError};

    #[test]
    fn new_rejects_invalid_config() {
        let config = MigrationConfig {
            community: " ".to_string(),
            ..MigrationConfig::default()
        };
        assert!(matches!(
            MigrationService::new(config).unwrap_err(),
            MigrationError::Config(ConfigError::EmptyCommunity)
        ));
    }

    #[test]
    fn missing_table_aborts_the_run() {
        let source = MemoryRecordSource::new().with_table("Addresses", Vec::new());
        let service = MigrationService::new(MigrationConfig::default()).unwrap();

        let err = service
            .run(&source, &mut SequentialIdAllocator::new())
            .unwrap_err();
        assert!(matches!(err, MigrationError::Source(SourceError::MissingTable(_))));
    }

    #[test]
    fn empty_tables_yield_only_the_candidate_role() {
        let mut config = MigrationConfig::default();
        config.tables.archived_people = None;
        let mut source = MemoryRecordSource::new();
        for table in config.tables.all() {
            source.insert_table(table, Vec::new());
        }
        let service = MigrationService::new(config).unwrap();

        let outcome = service
            .run(&source, &mut SequentialIdAllocator::new())
            .unwrap();
        assert!(outcome.graph.people.is_empty());
        assert!(outcome.graph.weekends.is_empty());
        assert_eq!(outcome.graph.roles.len(), 1);
        assert!(outcome.report.unresolved.is_empty());
    }
}
