//! Sponsor resolution.
//!
//! # Responsibility
//! - Resolve each person's ordered sponsor search list against the key index.
//!
//! # Invariants
//! - The first entry that resolves to another canonical person wins.
//! - Search lists are empty after linking, whether or not a sponsor was found.

use crate::model::person::Person;
use crate::service::dedup::PersonIndex;
use log::{debug, info};

/// Counts from one linking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SponsorLinkSummary {
    /// People that had a non-empty search list.
    pub searched: usize,
    pub linked: usize,
}

/// Links sponsors in place. `index` must have been built from `people`.
///
/// Entries that resolve to the person themself are skipped on purpose and
/// the search continues with the next entry; a person is never their own
/// sponsor.
pub fn link_sponsors(people: &mut [Person], index: &PersonIndex) -> SponsorLinkSummary {
    let mut summary = SponsorLinkSummary::default();

    // Resolve first against the unmodified list, then write back.
    let resolved: Vec<Option<usize>> = people
        .iter()
        .enumerate()
        .map(|(position, person)| {
            person
                .sponsor_search
                .iter()
                .filter_map(|key| index.position(key))
                .find(|sponsor| *sponsor != position)
        })
        .collect();

    let summaries: Vec<_> = resolved
        .iter()
        .map(|sponsor| sponsor.map(|position| people[position].summary()))
        .collect();

    for (person, sponsor) in people.iter_mut().zip(summaries) {
        if person.sponsor_search.is_empty() {
            continue;
        }
        summary.searched += 1;
        if let Some(sponsor) = sponsor {
            debug!(
                "event=sponsor_link module=sponsor_linker status=linked person_id={} sponsor_id={}",
                person.id, sponsor.id
            );
            person.sponsor = Some(sponsor);
            summary.linked += 1;
        }
        person.sponsor_search.clear();
    }

    info!(
        "event=sponsor_link module=sponsor_linker status=ok searched={} linked={}",
        summary.searched, summary.linked
    );
    summary
}
