//! Pass zero (load) and pass one (create-incomplete).

use super::{required_field, MigrationError, RepositoryPhase, RepositoryState, Runner};
use crate::github::{IssueEdit, NewIssue, TargetIssue, TargetTracker};
use crate::loader::load_all;
use crate::summary::{MigrationPass, RunSummary, TicketOutcome};
use crate::templates::generate_issue_title;
use crate::trac::{ticket_url, SourceTicket, SourceTracker};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Indexes existing issues by title.
///
/// When several issues share a title the lowest number wins, so a re-run
/// picks the same issue whatever order GitHub lists them in.
fn index_by_title(issues: Vec<TargetIssue>) -> HashMap<String, TargetIssue> {
    let mut by_title: HashMap<String, TargetIssue> = HashMap::with_capacity(issues.len());
    for issue in issues {
        match by_title.entry(issue.title.clone()) {
            Entry::Occupied(mut existing) => {
                let kept = existing.get().number.min(issue.number);
                warn!(
                    title = %issue.title,
                    first = existing.get().number,
                    second = issue.number,
                    kept,
                    "Several issues share a title"
                );
                if issue.number < existing.get().number {
                    existing.insert(issue);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(issue);
            }
        }
    }
    by_title
}

impl<S: SourceTracker, T: TargetTracker> Runner<S, T> {
    /// Lists the repository's milestones, labels and issues, then loads its tickets.
    pub(crate) async fn load_repository(
        &self,
        state: &mut RepositoryState,
    ) -> Result<(), MigrationError> {
        state.expect_phase(RepositoryPhase::NotLoaded, "load")?;
        let started = Instant::now();

        let milestones = self.target.list_milestones(&state.name).await?;
        let labels = self.target.list_labels(&state.name).await?;
        let issues = self.target.list_issues(&state.name).await?;

        state.taxonomy.preload(milestones, labels);
        let issue_count = issues.len();
        state.issues_by_title = index_by_title(issues);

        info!(
            milestones = state.taxonomy.milestone_count(),
            labels = state.taxonomy.label_count(),
            issues = issue_count,
            "Loaded repository taxonomy"
        );
        state.tickets = load_all(&self.source, &state.query).await?;
        state.advance(RepositoryPhase::TaxonomyLoaded);

        info!(
            tickets = state.tickets.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pass zero finished"
        );
        Ok(())
    }

    /// Creates an issue for every ticket that has none yet.
    ///
    /// Ticket failures are logged and recorded; they do not stop the pass.
    pub(crate) async fn pass_one(
        &self,
        state: &mut RepositoryState,
    ) -> Result<RunSummary, MigrationError> {
        state.expect_phase(RepositoryPhase::TaxonomyLoaded, "pass one")?;
        let started = Instant::now();
        let mut summary = RunSummary::default();

        let tickets = std::mem::take(&mut state.tickets);
        for ticket in &tickets {
            let span = info_span!("ticket", id = ticket.id);
            let outcome = match self.create_incomplete(state, ticket).instrument(span).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(repo = %state.name, ticket = ticket.id, error = %e, "Pass one failed for ticket");
                    TicketOutcome::Failed {
                        repository: state.name.clone(),
                        ticket: ticket.id,
                        pass: MigrationPass::One,
                        error: e.to_string(),
                    }
                }
            };
            summary.record(&outcome);
        }
        state.tickets = tickets;
        state.advance(RepositoryPhase::Pass1Complete);

        info!(
            created = summary.issues_created,
            matched = summary.issues_matched,
            failed = summary.tickets_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pass one finished"
        );
        Ok(summary)
    }

    /// Pass one for a single ticket: match an existing issue by title or
    /// create a new one carrying the marker label.
    async fn create_incomplete(
        &self,
        state: &mut RepositoryState,
        ticket: &SourceTicket,
    ) -> Result<TicketOutcome, MigrationError> {
        let github = &self.settings.github;
        let summary = required_field(ticket, "summary")?;
        let owner = required_field(ticket, "owner")?;
        let reporter = required_field(ticket, "reporter")?;
        let milestone = required_field(ticket, "milestone")?;

        let title = generate_issue_title(summary, ticket.id);
        let assignee = self.accounts.resolve_account(owner);

        if let Some(existing) = state.issues_by_title.get_mut(&title) {
            debug!(number = existing.number, "Issue exists already");
            if existing.assignee.as_deref() != Some(assignee.as_str()) {
                self.target
                    .edit_issue(
                        &state.name,
                        &github.default_account,
                        existing.number,
                        &IssueEdit::assignee(assignee.clone()),
                    )
                    .await?;
                info!(number = existing.number, assignee = %assignee, "Reassigned issue");
                existing.assignee = Some(assignee);
            }

            let existing = existing.clone();
            let number = existing.number;
            state.ticket_map.record(ticket.id, existing)?;
            return Ok(TicketOutcome::Matched {
                repository: state.name.clone(),
                ticket: ticket.id,
                number,
            });
        }

        let author = self.accounts.resolve_account(reporter);
        let body = self
            .renderer
            .render_issue_body(&ticket_url(&self.trac_url, ticket.id), &ticket.fields)?;

        let milestone = state
            .taxonomy
            .get_or_create_milestone(&self.target, &state.name, &github.default_account, milestone)
            .await?;

        let mut labels = Vec::new();
        for name in self.label_names(ticket) {
            let label = state
                .taxonomy
                .get_or_create_label(&self.target, &state.name, &github.default_account, &name)
                .await?;
            labels.push(label.name);
        }

        let new_issue = NewIssue {
            title: title.clone(),
            body,
            assignee: Some(assignee),
            milestone: milestone.map(|m| m.number),
            labels,
        };
        let issue = self
            .target
            .create_issue(&state.name, &author, &new_issue)
            .await?;

        info!(
            number = issue.number,
            author = %author,
            assignee = ?new_issue.assignee,
            labels = ?new_issue.labels,
            "Created issue"
        );

        let number = issue.number;
        state.issues_by_title.insert(title, issue.clone());
        state.ticket_map.record(ticket.id, issue)?;
        Ok(TicketOutcome::Created {
            repository: state.name.clone(),
            ticket: ticket.id,
            number,
        })
    }

    /// Labels for a new issue: the migrated and marker labels, then the
    /// value of each configured label field that is set.
    pub(crate) fn label_names(&self, ticket: &SourceTicket) -> Vec<String> {
        let github = &self.settings.github;
        let mut names = vec![github.migrated_label.clone(), github.marker_label.clone()];

        for field in &github.label_fields {
            if let Some(value) = ticket.non_empty_field(field) {
                let value = value.trim();
                if !names.iter().any(|name| name == value) {
                    names.push(value.to_string());
                }
            }
        }
        names
    }
}
