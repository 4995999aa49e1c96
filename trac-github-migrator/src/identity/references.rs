//! Trac ticket reference resolution across repositories.

use super::TicketMigrationMap;
use crate::trac::ticket_url;
use url::Url;

/// Resolves Trac ticket ids to GitHub issue references.
///
/// Holds a read-only view of every repository's [`TicketMigrationMap`] in
/// configured order; the first repository that knows a ticket wins.
pub struct ReferenceResolver<'a> {
    organisation: &'a str,
    trac_public_url: &'a Url,
    maps: Vec<(&'a str, &'a TicketMigrationMap)>,
}

impl<'a> ReferenceResolver<'a> {
    #[must_use]
    pub fn new(
        organisation: &'a str,
        trac_public_url: &'a Url,
        maps: Vec<(&'a str, &'a TicketMigrationMap)>,
    ) -> Self {
        Self {
            organisation,
            trac_public_url,
            maps,
        }
    }

    /// Returns `#n` for a ticket migrated into `current_repo`,
    /// `org/repo#n` for one migrated elsewhere, or the Trac ticket URL.
    #[must_use]
    pub fn resolve_ticket_reference(&self, id: u64, current_repo: &str) -> String {
        let found = self
            .maps
            .iter()
            .find_map(|(repo, map)| map.get(id).map(|issue| (*repo, issue.number)));

        match found {
            Some((repo, number)) if repo == current_repo => format!("#{number}"),
            Some((repo, number)) => format!("{}/{repo}#{number}", self.organisation),
            None => ticket_url(self.trac_public_url, id),
        }
    }
}
