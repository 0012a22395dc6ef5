//! JSON collection writer.
//!
//! # Invariants
//! - Every collection is serialized before the first file is written, so a
//!   serialization failure leaves the output directory untouched.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tdmigrate_core::MigrationGraph;

pub const PEOPLE_FILE: &str = "people.json";
pub const WEEKENDS_FILE: &str = "weekends.json";
pub const ROLES_FILE: &str = "weekend-roles.json";
pub const TABLES_FILE: &str = "tables.json";

#[derive(Debug)]
pub enum OutputError {
    Serialize {
        file: &'static str,
        source: serde_json::Error,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for OutputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize { file, source } => write!(f, "failed to serialize {file}: {source}"),
            Self::Io { path, source } => write!(f, "failed to write `{}`: {source}", path.display()),
        }
    }
}

impl Error for OutputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Writes the graph collections into `dir`, creating it when absent.
/// Returns the written paths in write order.
pub fn write_collections(
    dir: &Path,
    graph: &MigrationGraph,
    include_tables: bool,
) -> Result<Vec<PathBuf>, OutputError> {
    let mut documents = vec![
        (PEOPLE_FILE, render(PEOPLE_FILE, &graph.people)?),
        (WEEKENDS_FILE, render(WEEKENDS_FILE, &graph.weekends)?),
        (ROLES_FILE, render(ROLES_FILE, &graph.roles)?),
    ];
    if include_tables {
        documents.push((TABLES_FILE, render(TABLES_FILE, &graph.tables)?));
    }

    std::fs::create_dir_all(dir).map_err(|err| OutputError::Io {
        path: dir.to_path_buf(),
        source: err,
    })?;

    let mut written = Vec::with_capacity(documents.len());
    for (file, body) in documents {
        let path = dir.join(file);
        std::fs::write(&path, body).map_err(|err| OutputError::Io {
            path: path.clone(),
            source: err,
        })?;
        written.push(path);
    }
    Ok(written)
}

fn render<T: Serialize + ?Sized>(file: &'static str, value: &T) -> Result<String, OutputError> {
    serde_json::to_string_pretty(value).map_err(|err| OutputError::Serialize { file, source: err })
}
