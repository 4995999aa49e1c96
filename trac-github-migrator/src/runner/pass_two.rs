//! Pass two (complete).

use super::history::render_updates;
use super::{required_field, MigrationError, RepositoryPhase, RepositoryState, Runner};
use crate::github::{IssueEdit, IssueState, TargetIssue, TargetTracker};
use crate::identity::ReferenceResolver;
use crate::markup;
use crate::summary::{MigrationPass, RunSummary, TicketOutcome};
use crate::trac::{SourceTicket, SourceTracker};
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Terminal Trac status that closes the issue.
const CLOSED_STATUS: &str = "closed";

impl<S: SourceTracker, T: TargetTracker> Runner<S, T> {
    /// Finalises every issue that still carries the marker label.
    ///
    /// Ticket failures are logged and recorded; they do not stop the pass.
    pub(crate) async fn pass_two(
        &self,
        state: &RepositoryState,
        resolver: &ReferenceResolver<'_>,
    ) -> Result<RunSummary, MigrationError> {
        state.expect_phase(RepositoryPhase::Pass1Complete, "pass two")?;
        let started = Instant::now();
        let mut summary = RunSummary::default();

        for ticket in &state.tickets {
            let Some(issue) = state.ticket_map.get(ticket.id) else {
                warn!(ticket = ticket.id, "No issue recorded for ticket, skipping");
                continue;
            };

            let span = info_span!("ticket", id = ticket.id, number = issue.number);
            let outcome = match self
                .complete(state, resolver, ticket, issue)
                .instrument(span)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(repo = %state.name, ticket = ticket.id, error = %e, "Pass two failed for ticket");
                    TicketOutcome::Failed {
                        repository: state.name.clone(),
                        ticket: ticket.id,
                        pass: MigrationPass::Two,
                        error: e.to_string(),
                    }
                }
            };
            summary.record(&outcome);
        }

        info!(
            completed = summary.issues_completed,
            skipped = summary.issues_already_complete,
            failed = summary.tickets_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pass two finished"
        );
        Ok(summary)
    }

    /// Pass two for a single ticket.
    ///
    /// Writes the body, history and state, and removes the marker label
    /// last. An issue without the marker is left untouched. When an earlier
    /// run already wrote the description, only the missing comments are
    /// posted.
    async fn complete(
        &self,
        state: &RepositoryState,
        resolver: &ReferenceResolver<'_>,
        ticket: &SourceTicket,
        issue: &TargetIssue,
    ) -> Result<TicketOutcome, MigrationError> {
        let github = &self.settings.github;
        let repo = state.name.as_str();

        if !issue.has_label(&github.marker_label) {
            debug!(number = issue.number, "Issue has no marker label, skipping");
            return Ok(TicketOutcome::AlreadyComplete {
                repository: state.name.clone(),
                ticket: ticket.id,
                number: issue.number,
            });
        }

        let description = required_field(ticket, "description")?;
        let status = required_field(ticket, "status")?;

        let changelog = self.source.get_changelog(ticket.id).await?;
        let rewrite = |text: &str| markup::rewrite(text, repo, resolver);
        let updates = render_updates(&changelog, &self.renderer, rewrite)?;

        let description = format!("{}\n\n", rewrite(description));
        let resumed = issue.body.starts_with(&description);
        let posted = if resumed {
            warn!(
                number = issue.number,
                "Issue was partly completed by an earlier run, resuming"
            );
            self.target.list_comments(repo, issue.number).await?
        } else {
            let body = format!("{description}{}", issue.body);
            self.target
                .edit_issue(repo, &github.default_account, issue.number, &IssueEdit::body(body))
                .await?;
            Vec::new()
        };

        for update in &updates {
            if posted.contains(&update.body) {
                debug!(number = issue.number, time = %update.time, "Update already posted");
                continue;
            }
            let actor = self.accounts.resolve_account(&update.author);
            self.target
                .add_comment(repo, &actor, issue.number, &update.body)
                .await?;
        }

        if status == CLOSED_STATUS {
            self.target
                .edit_issue(
                    repo,
                    &github.default_account,
                    issue.number,
                    &IssueEdit::state(IssueState::Closed),
                )
                .await?;
        }

        self.target
            .remove_label(repo, &github.default_account, issue.number, &github.marker_label)
            .await?;

        info!(
            number = issue.number,
            comments = updates.len(),
            closed = status == CLOSED_STATUS,
            "Completed issue"
        );
        Ok(TicketOutcome::Completed {
            repository: state.name.clone(),
            ticket: ticket.id,
            number: issue.number,
        })
    }
}
