//! Role catalog normalization.
//!
//! # Responsibility
//! - Map raw job rows into Role entities.
//! - Append the synthetic Candidate role and expose its run-stable id.
//! - Build the migration-id -> Role index.
//!
//! # Invariants
//! - Exactly one Candidate role exists and it is the last role.
//! - The index is read-only once the catalog is built.

use crate::identity::{EntityId, IdentityAllocator};
use crate::model::role::Role;
use crate::source::RawRow;
use log::{info, warn};
use std::collections::HashMap;

const COL_ROLE_ID: &str = "ID";
const COL_ROLE_TITLE: &str = "Job";

/// Normalized roles plus the legacy-id lookup.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    roles: Vec<Role>,
    by_migration_id: HashMap<String, usize>,
    candidate_position: usize,
}

impl RoleCatalog {
    /// Builds the catalog from raw job rows.
    ///
    /// Rows without a legacy id still become roles but cannot be referenced
    /// from attendance rows.
    pub fn build(rows: &[RawRow], ids: &mut dyn IdentityAllocator) -> Self {
        let mut roles = Vec::with_capacity(rows.len() + 1);
        let mut by_migration_id = HashMap::new();

        for row in rows {
            let role = Role::from_title(ids.allocate(), row.text(COL_ROLE_TITLE).unwrap_or_default());
            match row.text(COL_ROLE_ID) {
                Some(migration_id) => {
                    if by_migration_id.contains_key(&migration_id) {
                        warn!(
                            "event=role_catalog module=role_catalog status=duplicate_id migration_id={migration_id}"
                        );
                    } else {
                        by_migration_id.insert(migration_id, roles.len());
                    }
                }
                None => warn!(
                    "event=role_catalog module=role_catalog status=no_id role_id={}",
                    role.id
                ),
            }
            roles.push(role);
        }

        let candidate_position = roles.len();
        roles.push(Role::candidate(ids.allocate()));

        info!(
            "event=role_catalog module=role_catalog status=ok roles={} indexed={}",
            roles.len(),
            by_migration_id.len()
        );

        Self {
            roles,
            by_migration_id,
            candidate_position,
        }
    }

    /// Role for a legacy job id.
    pub fn resolve(&self, migration_id: &str) -> Option<&Role> {
        self.by_migration_id
            .get(migration_id)
            .map(|position| &self.roles[*position])
    }

    pub fn candidate_role(&self) -> &Role {
        &self.roles[self.candidate_position]
    }

    /// Run-stable id of the synthetic Candidate role.
    pub fn candidate_role_id(&self) -> EntityId {
        self.candidate_role().id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn into_roles(self) -> Vec<Role> {
        self.roles
    }
}
