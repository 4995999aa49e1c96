//! Runner error types.

use super::RepositoryPhase;
use crate::config::ConfigError;
use crate::github::TrackerError;
use crate::templates::TemplateError;
use crate::trac::TracError;

/// Errors that stop a run before any ticket is processed.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration loading errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Trac client initialization errors.
    #[error(transparent)]
    Trac(#[from] TracError),

    /// GitHub client initialization errors.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Errors that fail a single ticket or a single repository.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Reading from Trac failed.
    #[error(transparent)]
    Source(#[from] TracError),

    /// Writing to GitHub failed.
    #[error(transparent)]
    Target(#[from] TrackerError),

    /// An issue body or comment could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The ticket lacks a field the migration cannot invent.
    #[error("Trac #{ticket} has no '{field}' field")]
    MissingField { ticket: u64, field: &'static str },

    /// A ticket and an issue are already mapped elsewhere.
    #[error("Trac #{ticket} cannot map to issue #{issue}: {reason}")]
    ConflictingMapping {
        ticket: u64,
        issue: u64,
        reason: String,
    },

    /// A pass was started before the previous one finished.
    #[error("Cannot run {operation} for '{repository}' while it is {phase}")]
    PhaseOrder {
        repository: String,
        operation: &'static str,
        phase: RepositoryPhase,
    },
}
