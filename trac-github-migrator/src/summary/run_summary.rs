//! Run summary types.

use super::result::TicketOutcome;

/// Summary of a complete run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of repositories configured.
    pub repositories_processed: usize,

    /// Number of repositories whose listing or ticket load failed.
    pub repositories_failed: usize,

    /// Number of Trac tickets loaded.
    pub tickets_loaded: usize,

    /// Number of issues created in pass one.
    pub issues_created: usize,

    /// Number of existing issues matched by title in pass one.
    pub issues_matched: usize,

    /// Number of issues finalised in pass two.
    pub issues_completed: usize,

    /// Number of issues pass two skipped because they had no marker.
    pub issues_already_complete: usize,

    /// Number of ticket-level failures across both passes.
    pub tickets_failed: usize,

    /// One line per failure, for the final report.
    pub failures: Vec<String>,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a ticket outcome.
    pub fn record(&mut self, outcome: &TicketOutcome) {
        match outcome {
            TicketOutcome::Created { .. } => self.issues_created += 1,
            TicketOutcome::Matched { .. } => self.issues_matched += 1,
            TicketOutcome::Completed { .. } => self.issues_completed += 1,
            TicketOutcome::AlreadyComplete { .. } => self.issues_already_complete += 1,
            TicketOutcome::Failed {
                repository,
                ticket,
                pass,
                error,
            } => {
                self.tickets_failed += 1;
                self.failures
                    .push(format!("{repository}: Trac #{ticket} failed in {pass}: {error}"));
            }
        }
    }

    /// Records a repository that could not be listed or loaded.
    pub fn record_repository_failure(&mut self, repository: &str, error: &str) {
        self.repositories_failed += 1;
        self.failures.push(format!("{repository}: {error}"));
    }

    /// Folds another summary's counters into this one.
    pub fn merge(&mut self, other: Self) {
        self.repositories_processed += other.repositories_processed;
        self.repositories_failed += other.repositories_failed;
        self.tickets_loaded += other.tickets_loaded;
        self.issues_created += other.issues_created;
        self.issues_matched += other.issues_matched;
        self.issues_completed += other.issues_completed;
        self.issues_already_complete += other.issues_already_complete;
        self.tickets_failed += other.tickets_failed;
        self.failures.extend(other.failures);
    }

    /// Returns true if any failures occurred.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.tickets_failed > 0 || self.repositories_failed > 0
    }

    /// Returns true if all operations were successful.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures()
    }
}
