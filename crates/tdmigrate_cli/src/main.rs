//! `tdmigrate` command line entry point.
//!
//! # Responsibility
//! - Parse run options, bootstrap logging and load the run config.
//! - Run the migration against a SQLite extract and write JSON collections.
//!
//! # Invariants
//! - Nothing is written to the output directory unless the run succeeds.
//! - Any failure exits non-zero with a one-line message on stderr.

mod output;

use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use tdmigrate_core::{
    default_log_level, init_console_logging, init_logging, MigrationConfig, MigrationOutcome,
    MigrationService, RandomIdAllocator, SqliteRecordSource,
};

#[derive(Parser, Debug)]
#[command(
    name = "tdmigrate",
    version,
    about = "Migrate a legacy Tres Dias roster extract into linked JSON collections"
)]
struct Cli {
    /// Legacy extract (SQLite file)
    #[arg(long, value_name = "PATH")]
    source: PathBuf,
    /// Directory for the JSON collections (created if absent)
    #[arg(long, value_name = "DIR", default_value = "output")]
    output: PathBuf,
    /// JSON run config; defaults apply to every missing field
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,
    /// Absolute directory for rotating log files; logs go to stderr otherwise
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,
    /// Also write tables.json with the seating table catalog
    #[arg(long)]
    include_tables: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = match cli.log_dir.as_deref() {
        Some(dir) => init_logging(&cli.log_level, dir),
        None => init_console_logging(&cli.log_level),
    };
    if let Err(err) = logging {
        eprintln!("tdmigrate: {err}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("tdmigrate: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = match cli.config.as_deref() {
        Some(path) => MigrationConfig::load(path).map_err(|err| err.to_string())?,
        None => MigrationConfig::default(),
    };
    let service = MigrationService::new(config).map_err(|err| err.to_string())?;
    let source = SqliteRecordSource::open(&cli.source).map_err(|err| err.to_string())?;

    let outcome = service
        .run(&source, &mut RandomIdAllocator::new())
        .map_err(|err| err.to_string())?;
    report(&outcome);

    let written = output::write_collections(&cli.output, &outcome.graph, cli.include_tables)
        .map_err(|err| err.to_string())?;
    for path in &written {
        info!("event=cli_write module=cli status=ok path={}", path.display());
    }
    println!(
        "wrote {} people, {} weekends, {} roles to {}",
        outcome.graph.people.len(),
        outcome.graph.weekends.len(),
        outcome.graph.roles.len(),
        cli.output.display()
    );
    Ok(())
}

fn report(outcome: &MigrationOutcome) {
    let report = &outcome.report;
    for unresolved in &report.unresolved {
        warn!("event=cli_report module=cli status=unresolved detail={unresolved}");
    }
    if !report.unresolved.is_empty() {
        eprintln!(
            "tdmigrate: dropped {} attendance rows with {} unresolved references",
            report.attendances_dropped,
            report.unresolved.len()
        );
    }
    info!(
        "event=cli_report module=cli status=ok people_parsed={} people_merged={} candidates={} sponsors_linked={} attendances={}",
        report.people_parsed,
        report.people_merged,
        report.candidates_enrolled,
        report.sponsors_linked,
        report.attendances_resolved
    );
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn defaults_apply_when_only_source_is_given() {
        let cli = Cli::try_parse_from(["tdmigrate", "--source", "legacy.sqlite"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("legacy.sqlite"));
        assert_eq!(cli.output, PathBuf::from("output"));
        assert!(cli.config.is_none());
        assert!(cli.log_dir.is_none());
        assert!(!cli.include_tables);
    }

    #[test]
    fn source_is_required() {
        assert!(Cli::try_parse_from(["tdmigrate"]).is_err());
    }
}
