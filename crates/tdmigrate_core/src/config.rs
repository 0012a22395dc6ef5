//! Migration run configuration.
//!
//! # Responsibility
//! - Name the legacy tables each pipeline phase reads.
//! - Carry the few per-community constants (label, archived status).
//!
//! # Invariants
//! - A validated config has non-empty, pairwise distinct table names.
//! - Every field has a default, so a partial JSON file is accepted.

use crate::model::person::PersonStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Community label stamped onto every weekend.
pub const DEFAULT_COMMUNITY: &str = "Birmingham Tres Dias";

/// Config loading/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse {
        path: String,
        source: serde_json::Error,
    },
    EmptyCommunity,
    EmptyTableName(&'static str),
    DuplicateTableName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read config `{path}`: {source}"),
            Self::Parse { path, source } => write!(f, "invalid config `{path}`: {source}"),
            Self::EmptyCommunity => write!(f, "community label cannot be empty"),
            Self::EmptyTableName(field) => write!(f, "table name `{field}` cannot be empty"),
            Self::DuplicateTableName(name) => {
                write!(f, "table `{name}` is configured for more than one input")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Legacy table names read by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    /// Active household rows.
    pub people: String,
    /// Archived household rows; `None` skips the archive.
    pub archived_people: Option<String>,
    /// Seating table catalog.
    pub table_names: String,
    /// Role/job catalog.
    pub roles: String,
    pub male_experience: String,
    pub female_experience: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            people: "Addresses".to_string(),
            archived_people: Some("Addresses Archive".to_string()),
            table_names: "Table Names".to_string(),
            roles: "Team Jobs".to_string(),
            male_experience: "ExperienceMale".to_string(),
            female_experience: "ExperienceFemale".to_string(),
        }
    }
}

impl TableNames {
    /// Every configured table in fetch order.
    pub fn all(&self) -> Vec<&str> {
        let mut names = vec![self.people.as_str()];
        if let Some(archived) = self.archived_people.as_deref() {
            names.push(archived);
        }
        names.extend([
            self.table_names.as_str(),
            self.roles.as_str(),
            self.male_experience.as_str(),
            self.female_experience.as_str(),
        ]);
        names
    }

    fn named_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("people", self.people.as_str())];
        if let Some(archived) = self.archived_people.as_deref() {
            fields.push(("archived_people", archived));
        }
        fields.extend([
            ("table_names", self.table_names.as_str()),
            ("roles", self.roles.as_str()),
            ("male_experience", self.male_experience.as_str()),
            ("female_experience", self.female_experience.as_str()),
        ]);
        fields
    }
}

/// Full configuration of one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub community: String,
    pub tables: TableNames,
    /// Status forced onto every person read from the archived table.
    pub archived_status: PersonStatus,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            community: DEFAULT_COMMUNITY.to_string(),
            tables: TableNames::default(),
            archived_status: PersonStatus::Inactive,
        }
    }
}

impl MigrationConfig {
    /// Loads and validates a JSON config file.
    ///
    /// # Errors
    /// - `Io` when the file cannot be read.
    /// - `Parse` when the JSON does not match the config shape.
    /// - Any `validate()` failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: display.clone(),
            source: err,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|err| ConfigError::Parse {
            path: display,
            source: err,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates declaration-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.community.trim().is_empty() {
            return Err(ConfigError::EmptyCommunity);
        }

        let mut seen = BTreeSet::new();
        for (field, name) in self.tables.named_fields() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::EmptyTableName(field));
            }
            if !seen.insert(trimmed) {
                return Err(ConfigError::DuplicateTableName(trimmed.to_string()));
            }
        }
        Ok(())
    }
}
