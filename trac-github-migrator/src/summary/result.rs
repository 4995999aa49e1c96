//! Per-ticket outcome types.

use std::fmt;

/// The two migration passes that touch individual tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPass {
    /// Issue creation and assignee reconciliation.
    One,
    /// Body, history and state finalisation.
    Two,
}

impl fmt::Display for MigrationPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("pass one"),
            Self::Two => f.write_str("pass two"),
        }
    }
}

/// Result of processing a single ticket in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketOutcome {
    /// Pass one created a new issue.
    Created {
        repository: String,
        ticket: u64,
        number: u64,
    },

    /// Pass one found an issue with the same title from an earlier run.
    Matched {
        repository: String,
        ticket: u64,
        number: u64,
    },

    /// Pass two finalised the issue.
    Completed {
        repository: String,
        ticket: u64,
        number: u64,
    },

    /// Pass two found no marker label and left the issue alone.
    AlreadyComplete {
        repository: String,
        ticket: u64,
        number: u64,
    },

    /// Processing failed; the ticket is retried by the next run.
    Failed {
        repository: String,
        ticket: u64,
        pass: MigrationPass,
        error: String,
    },
}

impl TicketOutcome {
    /// Returns the Trac ticket id this outcome is about.
    #[must_use]
    pub fn ticket(&self) -> u64 {
        match self {
            Self::Created { ticket, .. }
            | Self::Matched { ticket, .. }
            | Self::Completed { ticket, .. }
            | Self::AlreadyComplete { ticket, .. }
            | Self::Failed { ticket, .. } => *ticket,
        }
    }

    /// Returns true for [`TicketOutcome::Failed`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
