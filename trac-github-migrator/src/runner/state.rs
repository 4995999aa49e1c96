//! Per-repository migration state.

use super::MigrationError;
use crate::config::RepositorySettings;
use crate::github::TargetIssue;
use crate::identity::TicketMigrationMap;
use crate::taxonomy::TaxonomyCache;
use crate::trac::SourceTicket;
use std::collections::HashMap;
use std::fmt;

/// How far a repository has progressed through the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RepositoryPhase {
    /// Nothing has been read yet.
    NotLoaded,
    /// Milestones, labels, issues and tickets are loaded.
    TaxonomyLoaded,
    /// Every ticket has been through pass one.
    Pass1Complete,
    /// Every ticket has been through pass two.
    Pass2Complete,
}

impl fmt::Display for RepositoryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotLoaded => "not loaded",
            Self::TaxonomyLoaded => "loaded",
            Self::Pass1Complete => "through pass one",
            Self::Pass2Complete => "through pass two",
        })
    }
}

/// Everything the run knows about one target repository.
#[derive(Debug)]
pub struct RepositoryState {
    pub(crate) name: String,
    pub(crate) query: String,
    pub(crate) phase: RepositoryPhase,
    pub(crate) taxonomy: TaxonomyCache,
    pub(crate) issues_by_title: HashMap<String, TargetIssue>,
    pub(crate) tickets: Vec<SourceTicket>,
    pub(crate) ticket_map: TicketMigrationMap,
}

impl RepositoryState {
    #[must_use]
    pub fn new(settings: &RepositorySettings) -> Self {
        Self {
            name: settings.name.clone(),
            query: settings.query.clone(),
            phase: RepositoryPhase::NotLoaded,
            taxonomy: TaxonomyCache::new(),
            issues_by_title: HashMap::new(),
            tickets: Vec::new(),
            ticket_map: TicketMigrationMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn phase(&self) -> RepositoryPhase {
        self.phase
    }

    #[must_use]
    pub fn tickets(&self) -> &[SourceTicket] {
        &self.tickets
    }

    #[must_use]
    pub fn ticket_map(&self) -> &TicketMigrationMap {
        &self.ticket_map
    }

    /// Fails with [`MigrationError::PhaseOrder`] unless the repository is in `expected`.
    pub(crate) fn expect_phase(
        &self,
        expected: RepositoryPhase,
        operation: &'static str,
    ) -> Result<(), MigrationError> {
        if self.phase == expected {
            return Ok(());
        }
        Err(MigrationError::PhaseOrder {
            repository: self.name.clone(),
            operation,
            phase: self.phase,
        })
    }

    pub(crate) fn advance(&mut self, phase: RepositoryPhase) {
        debug_assert!(phase > self.phase);
        self.phase = phase;
    }
}
