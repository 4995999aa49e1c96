//! Identity resolution.
//!
//! Maps Trac usernames to GitHub accounts ([`AccountResolver`]) and Trac
//! ticket ids to GitHub issue references ([`ReferenceResolver`]).

mod mapping;
mod references;
mod similarity;

pub use mapping::TicketMigrationMap;
pub use references::ReferenceResolver;
pub use similarity::similarity;

use std::collections::BTreeMap;
use tracing::debug;

/// Minimum similarity for a fuzzy username match.
pub const FUZZY_MATCH_CUTOFF: f64 = 0.6;

/// Resolves Trac usernames to GitHub logins.
#[derive(Debug, Clone)]
pub struct AccountResolver {
    usernames: BTreeMap<String, String>,
    default_account: String,
}

impl AccountResolver {
    /// Creates a resolver over a `trac name -> github login` table.
    #[must_use]
    pub fn new(usernames: BTreeMap<String, String>, default_account: impl Into<String>) -> Self {
        Self {
            usernames,
            default_account: default_account.into(),
        }
    }

    /// Returns the account used when a name cannot be resolved.
    #[must_use]
    pub fn default_account(&self) -> &str {
        &self.default_account
    }

    /// Resolves a Trac username to a GitHub login. Never fails.
    ///
    /// An exact table entry wins. Otherwise the name is compared with every
    /// table key and accepted only when exactly one key is at least
    /// [`FUZZY_MATCH_CUTOFF`] similar. Anything else, including blank names
    /// and entries mapped to an empty login, resolves to the default account.
    #[must_use]
    pub fn resolve_account(&self, source_name: &str) -> String {
        let name = source_name.trim();
        if name.is_empty() {
            return self.default_account.clone();
        }

        let key = if self.usernames.contains_key(name) {
            Some(name)
        } else {
            self.closest_key(name)
        };

        match key
            .and_then(|key| self.usernames.get(key))
            .map(|login| login.trim())
            .filter(|login| !login.is_empty())
        {
            Some(login) => login.to_string(),
            None => {
                debug!(name, fallback = %self.default_account, "Unresolved Trac user");
                self.default_account.clone()
            }
        }
    }

    fn closest_key(&self, name: &str) -> Option<&str> {
        let mut candidates = self
            .usernames
            .keys()
            .filter(|key| similarity(name, key) >= FUZZY_MATCH_CUTOFF);

        match (candidates.next(), candidates.next()) {
            (Some(key), None) => Some(key.as_str()),
            (Some(first), Some(second)) => {
                debug!(name, first = %first, second = %second, "Ambiguous Trac user");
                None
            }
            _ => None,
        }
    }
}
