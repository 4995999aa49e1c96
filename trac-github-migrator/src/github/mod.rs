//! GitHub issue tracker access.
//!
//! [`TargetTracker`] is the seam the migration engine writes through. Every
//! write names the acting account, because the authenticated identity is
//! what GitHub displays as the author of an issue or comment.
//! [`GitHubTracker`] implements it with one `octocrab` client per configured
//! account token.

mod error;
mod issue;

pub use error::TrackerError;
pub use issue::{IssueEdit, IssueState, Label, Milestone, NewIssue, TargetIssue};

use crate::config::GitHubSettings;
use crate::rate_limit::{ensure_core_rate_limit, with_backoff};
use async_trait::async_trait;
use octocrab::models::issues::Issue;
use octocrab::{params, Octocrab, Page};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, info_span, Instrument};

/// Results per page for list calls.
const RESULTS_PER_PAGE: u8 = 100;

/// Operations consumed from the target tracker, scoped per repository.
#[async_trait]
pub trait TargetTracker: Send + Sync {
    /// Lists all milestones (open and closed).
    async fn list_milestones(&self, repo: &str) -> Result<Vec<Milestone>, TrackerError>;

    /// Creates a milestone.
    async fn create_milestone(
        &self,
        repo: &str,
        actor: &str,
        title: &str,
    ) -> Result<Milestone, TrackerError>;

    /// Lists all labels.
    async fn list_labels(&self, repo: &str) -> Result<Vec<Label>, TrackerError>;

    /// Creates a label.
    async fn create_label(
        &self,
        repo: &str,
        actor: &str,
        name: &str,
        color: &str,
    ) -> Result<Label, TrackerError>;

    /// Lists all issues (open and closed), excluding pull requests.
    async fn list_issues(&self, repo: &str) -> Result<Vec<TargetIssue>, TrackerError>;

    /// Creates an issue authored by `actor`.
    async fn create_issue(
        &self,
        repo: &str,
        actor: &str,
        issue: &NewIssue,
    ) -> Result<TargetIssue, TrackerError>;

    /// Applies a partial update to an issue.
    async fn edit_issue(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        edit: &IssueEdit,
    ) -> Result<(), TrackerError>;

    /// Lists the bodies of an issue's comments, oldest first.
    async fn list_comments(&self, repo: &str, number: u64) -> Result<Vec<String>, TrackerError>;

    /// Adds a comment authored by `actor`.
    async fn add_comment(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        body: &str,
    ) -> Result<(), TrackerError>;

    /// Detaches a label from an issue.
    async fn remove_label(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError>;
}

/// Milestone fields we read back from the REST API.
#[derive(Debug, Deserialize)]
struct MilestonePayload {
    number: u64,
    title: String,
}

impl From<MilestonePayload> for Milestone {
    fn from(payload: MilestonePayload) -> Self {
        Self {
            number: payload.number,
            title: payload.title,
        }
    }
}

/// GitHub tracker for one organisation, acting as several accounts.
pub struct GitHubTracker {
    organisation: String,
    default_account: String,
    clients: HashMap<String, Octocrab>,
}

impl GitHubTracker {
    /// Builds one authenticated client per configured account token.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingCredentials`] if the default account has
    /// no token, or an API error if a client cannot be built.
    pub fn new(settings: &GitHubSettings) -> Result<Self, TrackerError> {
        if !settings.tokens.contains_key(&settings.default_account) {
            return Err(TrackerError::MissingCredentials {
                account: settings.default_account.clone(),
            });
        }

        let mut clients = HashMap::with_capacity(settings.tokens.len());
        for (account, token) in &settings.tokens {
            let octocrab = Octocrab::builder().personal_token(token.clone()).build()?;
            clients.insert(account.clone(), octocrab);
        }

        info!(
            organisation = %settings.organisation,
            accounts = clients.len(),
            "GitHub clients ready"
        );

        Ok(Self {
            organisation: settings.organisation.clone(),
            default_account: settings.default_account.clone(),
            clients,
        })
    }

    /// Returns the client for `actor`, falling back to the default account.
    fn client_for(&self, actor: &str) -> Result<&Octocrab, TrackerError> {
        let actor = actor.trim();
        if let Some(client) = self.clients.get(actor) {
            return Ok(client);
        }

        debug!(actor, fallback = %self.default_account, "No token for account");
        self.clients
            .get(&self.default_account)
            .ok_or_else(|| TrackerError::MissingCredentials {
                account: self.default_account.clone(),
            })
    }

    fn default_client(&self) -> Result<&Octocrab, TrackerError> {
        self.client_for(&self.default_account)
    }

    fn repo_route(&self, repo: &str, suffix: &str) -> String {
        format!("/repos/{}/{repo}/{suffix}", self.organisation)
    }

    fn full_name(&self, repo: &str) -> String {
        format!("{}/{repo}", self.organisation)
    }
}

#[async_trait]
impl TargetTracker for GitHubTracker {
    async fn list_milestones(&self, repo: &str) -> Result<Vec<Milestone>, TrackerError> {
        let octocrab = self.default_client()?;
        let route = self.repo_route(repo, "milestones");
        let route = &route;

        let milestones = with_backoff("list_milestones", move || async move {
            let first: Page<MilestonePayload> = octocrab
                .get(
                    route,
                    Some(&[("state", "all"), ("per_page", "100")]),
                )
                .await?;
            Ok::<_, TrackerError>(octocrab.all_pages(first).await?)
        })
        .await
        .map_err(|e| e.for_repository(self.full_name(repo)))?;

        Ok(milestones.into_iter().map(Milestone::from).collect())
    }

    async fn create_milestone(
        &self,
        repo: &str,
        actor: &str,
        title: &str,
    ) -> Result<Milestone, TrackerError> {
        let octocrab = self.client_for(actor)?;
        ensure_core_rate_limit(octocrab, actor).await?;

        let created: MilestonePayload = octocrab
            .post(
                self.repo_route(repo, "milestones"),
                Some(&serde_json::json!({ "title": title })),
            )
            .await?;

        Ok(created.into())
    }

    async fn list_labels(&self, repo: &str) -> Result<Vec<Label>, TrackerError> {
        let octocrab = self.default_client()?;
        let organisation = self.organisation.as_str();

        let labels = with_backoff("list_labels", move || async move {
            let first = octocrab
                .issues(organisation, repo)
                .list_labels_for_repo()
                .per_page(RESULTS_PER_PAGE)
                .send()
                .await?;
            Ok::<_, TrackerError>(octocrab.all_pages(first).await?)
        })
        .await
        .map_err(|e| e.for_repository(self.full_name(repo)))?;

        Ok(labels
            .into_iter()
            .map(|label| Label {
                name: label.name,
                color: label.color,
            })
            .collect())
    }

    async fn create_label(
        &self,
        repo: &str,
        actor: &str,
        name: &str,
        color: &str,
    ) -> Result<Label, TrackerError> {
        let octocrab = self.client_for(actor)?;
        ensure_core_rate_limit(octocrab, actor).await?;

        let label = octocrab
            .issues(&self.organisation, repo)
            .create_label(name, color, "")
            .await?;

        Ok(Label {
            name: label.name,
            color: label.color,
        })
    }

    async fn list_issues(&self, repo: &str) -> Result<Vec<TargetIssue>, TrackerError> {
        let span = info_span!("list_issues", repo = %self.full_name(repo));
        let octocrab = self.default_client()?;
        let organisation = self.organisation.as_str();

        async {
            let issues = with_backoff("list_issues", move || async move {
                let first = octocrab
                    .issues(organisation, repo)
                    .list()
                    .state(params::State::All)
                    .per_page(RESULTS_PER_PAGE)
                    .send()
                    .await?;
                Ok::<_, TrackerError>(octocrab.all_pages(first).await?)
            })
            .await
            .map_err(|e| e.for_repository(self.full_name(repo)))?;

            let issues: Vec<TargetIssue> = issues
                .into_iter()
                .filter(|issue| issue.pull_request.is_none())
                .map(target_issue)
                .collect();

            debug!(count = issues.len(), "Listed issues");
            Ok(issues)
        }
        .instrument(span)
        .await
    }

    async fn create_issue(
        &self,
        repo: &str,
        actor: &str,
        issue: &NewIssue,
    ) -> Result<TargetIssue, TrackerError> {
        let octocrab = self.client_for(actor)?;
        ensure_core_rate_limit(octocrab, actor).await?;

        let handler = octocrab.issues(&self.organisation, repo);
        let mut builder = handler
            .create(&issue.title)
            .body(&issue.body)
            .labels(issue.labels.clone());
        if let Some(assignee) = &issue.assignee {
            builder = builder.assignees(vec![assignee.clone()]);
        }
        if let Some(milestone) = issue.milestone {
            builder = builder.milestone(milestone);
        }

        let created = builder.send().await?;
        Ok(target_issue(created))
    }

    async fn edit_issue(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        edit: &IssueEdit,
    ) -> Result<(), TrackerError> {
        let octocrab = self.client_for(actor)?;
        ensure_core_rate_limit(octocrab, actor).await?;

        let assignees: Vec<String> = edit.assignee.iter().cloned().collect();
        let handler = octocrab.issues(&self.organisation, repo);
        let mut builder = handler.update(number);
        if let Some(body) = &edit.body {
            builder = builder.body(body);
        }
        if !assignees.is_empty() {
            builder = builder.assignees(&assignees);
        }
        if let Some(state) = edit.state {
            builder = builder.state(match state {
                IssueState::Open => octocrab::models::IssueState::Open,
                IssueState::Closed => octocrab::models::IssueState::Closed,
            });
        }

        builder
            .send()
            .await
            .map_err(|e| TrackerError::from(e).for_issue(self.full_name(repo), number))?;
        Ok(())
    }

    async fn list_comments(&self, repo: &str, number: u64) -> Result<Vec<String>, TrackerError> {
        let octocrab = self.default_client()?;
        let organisation = self.organisation.as_str();

        let comments = with_backoff("list_comments", move || async move {
            let first = octocrab
                .issues(organisation, repo)
                .list_comments(number)
                .per_page(RESULTS_PER_PAGE)
                .send()
                .await?;
            Ok::<_, TrackerError>(octocrab.all_pages(first).await?)
        })
        .await
        .map_err(|e| e.for_issue(self.full_name(repo), number))?;

        Ok(comments
            .into_iter()
            .map(|comment| comment.body.unwrap_or_default())
            .collect())
    }

    async fn add_comment(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        body: &str,
    ) -> Result<(), TrackerError> {
        let octocrab = self.client_for(actor)?;
        ensure_core_rate_limit(octocrab, actor).await?;

        octocrab
            .issues(&self.organisation, repo)
            .create_comment(number, body)
            .await
            .map_err(|e| TrackerError::from(e).for_issue(self.full_name(repo), number))?;
        Ok(())
    }

    async fn remove_label(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError> {
        let octocrab = self.client_for(actor)?;
        ensure_core_rate_limit(octocrab, actor).await?;

        octocrab
            .issues(&self.organisation, repo)
            .remove_label(number, label)
            .await
            .map_err(|e| TrackerError::from(e).for_issue(self.full_name(repo), number))?;
        Ok(())
    }
}

/// Converts an API issue into the handle the engine works with.
fn target_issue(issue: Issue) -> TargetIssue {
    TargetIssue {
        number: issue.number,
        title: issue.title,
        body: issue.body.unwrap_or_default(),
        assignee: issue.assignee.map(|author| author.login),
        labels: issue.labels.into_iter().map(|label| label.name).collect(),
        state: match issue.state {
            octocrab::models::IssueState::Closed => IssueState::Closed,
            _ => IssueState::Open,
        },
        url: issue.html_url.to_string(),
    }
}
