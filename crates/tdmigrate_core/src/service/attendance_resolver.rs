//! Attendance reference resolution.
//!
//! # Responsibility
//! - Rewrite pending attendance stubs into links to canonical entities.
//! - Drop stubs whose person or role cannot be resolved, with a diagnostic.
//! - Append experience history onto resolved people.
//!
//! # Invariants
//! - After resolution every attendance is resolved; none dangles.
//! - Unresolved references never escape as errors; they are reported.

use crate::identity::EntityId;
use crate::model::person::{ExperienceEntry, Person};
use crate::model::weekend::{Attendance, AttendanceLink, PendingLink, ResolvedLink, Weekend, WeekendKey};
use crate::service::dedup::PersonIndex;
use crate::service::role_catalog::RoleCatalog;
use crate::service::weekend_roster::WeekendBook;
use log::{info, warn};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Which side of an attendance stub failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Person,
    Role,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Role => "role",
        }
    }
}

/// Diagnostic for a legacy key with no canonical match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub weekend: WeekendKey,
    pub kind: ReferenceKind,
    /// Offending legacy key; empty when the source cell was blank.
    pub key: String,
}

impl Display for UnresolvedReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unresolved {} reference `{}` on weekend {}",
            self.kind.as_str(),
            self.key,
            self.weekend
        )
    }
}

/// Result of one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolutionSummary {
    pub resolved: usize,
    /// Stubs removed because at least one reference was unresolved.
    pub dropped: usize,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Resolves every pending stub in `book`.
///
/// `index` must have been built from `people`.
pub fn resolve_attendance(
    book: &mut WeekendBook,
    people: &mut [Person],
    index: &PersonIndex,
    roles: &RoleCatalog,
) -> ResolutionSummary {
    let mut summary = ResolutionSummary::default();
    for weekend in book.weekends_mut() {
        resolve_weekend(weekend, people, index, roles, &mut summary);
    }

    info!(
        "event=attendance_resolve module=attendance_resolver status=ok resolved={} dropped={} unresolved={}",
        summary.resolved,
        summary.dropped,
        summary.unresolved.len()
    );
    summary
}

fn resolve_weekend(
    weekend: &mut Weekend,
    people: &mut [Person],
    index: &PersonIndex,
    roles: &RoleCatalog,
    summary: &mut ResolutionSummary,
) {
    let key = weekend.key();
    let attendees = std::mem::take(&mut weekend.attendees);
    let mut kept = Vec::with_capacity(attendees.len());

    for attendance in attendees {
        if attendance.is_resolved() {
            kept.push(attendance);
            continue;
        }
        let Some(pending) = attendance.pending_link() else {
            continue;
        };

        match lookup(pending, index, roles, &key) {
            Ok((position, role_id, role_title)) => {
                let person = &mut people[position];
                person.experience.push(ExperienceEntry {
                    role_title: role_title.clone(),
                    weekend_number: weekend.weekend_number.clone(),
                    weekend_gender: weekend.gender,
                });
                kept.push(Attendance {
                    link: AttendanceLink::Resolved(ResolvedLink {
                        person: person.summary(),
                        role_id,
                        role_title,
                    }),
                    is_confirmed: attendance.is_confirmed,
                    did_attend: attendance.did_attend,
                });
                summary.resolved += 1;
            }
            Err(failures) => {
                for failure in &failures {
                    warn!(
                        "event=attendance_resolve module=attendance_resolver status=dropped weekend_id={} detail={}",
                        weekend.id, failure
                    );
                }
                summary.unresolved.extend(failures);
                summary.dropped += 1;
            }
        }
    }

    weekend.attendees = kept;
}

type Resolved = (usize, EntityId, String);

fn lookup(
    pending: &PendingLink,
    index: &PersonIndex,
    roles: &RoleCatalog,
    weekend: &WeekendKey,
) -> Result<Resolved, Vec<UnresolvedReference>> {
    let person = index.position(&pending.migration_person_id);
    let role = pending
        .migration_role_id
        .as_deref()
        .and_then(|role_id| roles.resolve(role_id));

    match (person, role) {
        (Some(position), Some(role)) => Ok((position, role.id, role.title.clone())),
        (person, role) => {
            let mut failures = Vec::new();
            if person.is_none() {
                failures.push(UnresolvedReference {
                    weekend: weekend.clone(),
                    kind: ReferenceKind::Person,
                    key: pending.migration_person_id.clone(),
                });
            }
            if role.is_none() {
                failures.push(UnresolvedReference {
                    weekend: weekend.clone(),
                    kind: ReferenceKind::Role,
                    key: pending.migration_role_id.clone().unwrap_or_default(),
                });
            }
            Err(failures)
        }
    }
}
