//! Orchestrates the two-pass Trac to GitHub migration.
//!
//! A run has two phases separated by a barrier:
//!
//! 1. For every repository (concurrently): list milestones, labels and
//!    issues, load the Trac tickets, then run pass one, which creates each
//!    missing issue with a placeholder body and the marker label.
//! 2. Once every repository has finished pass one, every ticket id can be
//!    resolved to an issue, so pass two rewrites the descriptions, posts the
//!    history as comments, closes closed tickets and removes the marker.
//!
//! The marker label is the only checkpoint. Re-running after a failure
//! matches the issues created earlier by title and finishes the ones that
//! still carry the marker.

mod config;
mod error;
mod history;
mod pass_one;
mod pass_two;
mod state;


pub use config::{RunnerConfig, DEFAULT_CONCURRENCY};
pub use error::{MigrationError, RunnerError};
pub use state::{RepositoryPhase, RepositoryState};

use crate::config::{ConfigError, MigrationConfig};
use crate::github::{GitHubTracker, TargetTracker};
use crate::identity::{AccountResolver, ReferenceResolver, TicketMigrationMap};
use crate::summary::RunSummary;
use crate::templates::TemplateRenderer;
use crate::trac::{public_url, SourceTicket, SourceTracker, TracClient, TracError};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use url::Url;

/// Runs a migration against a source and a target tracker.
pub struct Runner<S = TracClient, T = GitHubTracker> {
    config: RunnerConfig,
    settings: MigrationConfig,
    trac_url: Url,
    source: S,
    target: T,
    accounts: AccountResolver,
    renderer: TemplateRenderer,
}

impl Runner {
    /// Loads and validates the configuration and connects to Trac and GitHub.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the configuration is invalid or a client
    /// cannot be built.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let settings = MigrationConfig::load(config.config_path())?
            .with_default_token(config.token().map(str::to_string));
        settings.validate(config.config_path())?;

        let trac_url = parse_trac_url(&config, &settings)?;
        let source = TracClient::new(&trac_url)?;
        let target = GitHubTracker::new(&settings.github)?;

        Self::with_trackers(config, settings, source, target)
    }
}

impl<S: SourceTracker, T: TargetTracker> Runner<S, T> {
    /// Builds a runner over already constructed trackers.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the Trac URL is missing or invalid.
    pub fn with_trackers(
        config: RunnerConfig,
        settings: MigrationConfig,
        source: S,
        target: T,
    ) -> Result<Self, RunnerError> {
        let trac_url = public_url(&parse_trac_url(&config, &settings)?);
        let accounts = AccountResolver::new(
            settings.usernames.clone(),
            settings.github.default_account.clone(),
        );

        Ok(Self {
            config,
            settings,
            trac_url,
            source,
            target,
            accounts,
            renderer: TemplateRenderer::new(),
        })
    }

    /// Returns the source tracker.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the target tracker.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Executes the full migration.
    ///
    /// Ticket and repository failures are recorded in the returned summary;
    /// only setup problems are returned as errors.
    ///
    /// # Errors
    ///
    /// Reserved for failures that affect the whole run; nothing after
    /// construction currently produces one.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new(self.config.dry_run());
        let mut states: Vec<RepositoryState> = self
            .settings
            .repositories
            .iter()
            .map(RepositoryState::new)
            .collect();
        summary.repositories_processed = states.len();

        info!(
            repositories = states.len(),
            organisation = %self.settings.github.organisation,
            dry_run = self.config.dry_run(),
            "Starting migration"
        );

        let started = Instant::now();
        let results: Vec<RunSummary> = stream::iter(states.iter_mut())
            .map(|state| {
                let span = info_span!("repository", repo = %state.name());
                self.prepare_repository(state).instrument(span)
            })
            .buffer_unordered(self.config.concurrency())
            .collect()
            .await;
        for result in results {
            summary.merge(result);
        }

        if self.config.dry_run() {
            for state in &states {
                self.print_dry_run_preview(state);
            }
            return Ok(summary);
        }
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pass one finished for all repositories"
        );

        let started = Instant::now();
        let maps: Vec<(&str, &TicketMigrationMap)> = states
            .iter()
            .map(|state| (state.name(), state.ticket_map()))
            .collect();
        let resolver = ReferenceResolver::new(
            &self.settings.github.organisation,
            &self.trac_url,
            maps,
        );

        let results: Vec<RunSummary> = stream::iter(states.iter())
            .map(|state| self.complete_repository(state, &resolver))
            .buffer_unordered(self.config.concurrency())
            .collect()
            .await;
        for result in results {
            summary.merge(result);
        }

        for state in &mut states {
            if state.phase() == RepositoryPhase::Pass1Complete {
                state.advance(RepositoryPhase::Pass2Complete);
            }
        }
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pass two finished for all repositories"
        );

        Ok(summary)
    }

    /// Pass zero, ticket load and (unless dry-running) pass one for one repository.
    async fn prepare_repository(&self, state: &mut RepositoryState) -> RunSummary {
        let mut summary = RunSummary::default();

        if let Err(e) = self.load_repository(state).await {
            error!(error = %e, "Failed to load repository");
            summary.record_repository_failure(state.name(), &e.to_string());
            return summary;
        }
        summary.tickets_loaded = state.tickets().len();

        if self.config.dry_run() {
            return summary;
        }

        match self.pass_one(state).await {
            Ok(result) => summary.merge(result),
            Err(e) => {
                error!(error = %e, "Pass one failed");
                summary.record_repository_failure(state.name(), &e.to_string());
            }
        }
        summary
    }

    /// Pass two for one repository.
    async fn complete_repository(
        &self,
        state: &RepositoryState,
        resolver: &ReferenceResolver<'_>,
    ) -> RunSummary {
        if state.phase() != RepositoryPhase::Pass1Complete {
            debug!(repo = %state.name(), phase = %state.phase(), "Skipping pass two");
            return RunSummary::default();
        }

        let span = info_span!("repository", repo = %state.name());
        match self.pass_two(state, resolver).instrument(span).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(repo = %state.name(), error = %e, "Pass two failed");
                let mut summary = RunSummary::default();
                summary.record_repository_failure(state.name(), &e.to_string());
                summary
            }
        }
    }

    fn print_dry_run_preview(&self, state: &RepositoryState) {
        println!(
            "\n[DRY RUN] Repository: {}/{}",
            self.settings.github.organisation,
            state.name()
        );

        if state.phase() == RepositoryPhase::NotLoaded {
            println!("  Could not be loaded, see log");
            return;
        }

        println!("  Found {} tickets:\n", state.tickets().len());
        for (i, ticket) in state.tickets().iter().enumerate() {
            let title = ticket
                .field("summary")
                .map(|summary| crate::templates::generate_issue_title(summary, ticket.id));
            let action = match &title {
                None => "Would fail: no summary".to_string(),
                Some(title) => match state.issues_by_title.get(title) {
                    Some(issue) => format!("Would match issue #{}", issue.number),
                    None => "Would create issue".to_string(),
                },
            };
            println!(
                "  [{}/{}] {}: {action}",
                i + 1,
                state.tickets().len(),
                title.as_deref().unwrap_or("?")
            );
        }
        println!();
    }
}

/// Lists every RPC method the Trac server exposes, with its help text.
///
/// # Errors
///
/// Returns [`TracError`] if the server cannot be queried.
pub async fn list_rpc_methods<S: SourceTracker + ?Sized>(
    source: &S,
) -> Result<Vec<(String, String)>, TracError> {
    let mut methods = Vec::new();
    for method in source.list_methods().await? {
        let help = source.method_help(&method).await?;
        methods.push((method, help));
    }
    Ok(methods)
}

pub(crate) fn required_field<'t>(
    ticket: &'t SourceTicket,
    field: &'static str,
) -> Result<&'t str, MigrationError> {
    ticket.field(field).ok_or(MigrationError::MissingField {
        ticket: ticket.id,
        field,
    })
}

fn parse_trac_url(config: &RunnerConfig, settings: &MigrationConfig) -> Result<Url, ConfigError> {
    settings
        .trac_url()
        .map_err(|message| ConfigError::ValidationError {
            path: config.config_path().display().to_string(),
            message,
        })
}
