//! In-memory trackers for exercising the migration engine.

use crate::github::{
    IssueEdit, IssueState, Label, Milestone, NewIssue, TargetIssue, TargetTracker, TrackerError,
};
use crate::trac::{ChangeLogEntry, SourceTicket, SourceTracker, TracError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) fn time(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// A ticket with every field the migration requires.
pub(crate) fn ticket(id: u64, summary: &str) -> SourceTicket {
    SourceTicket {
        id,
        created: time("2010-05-01 10:00:00"),
        changed: time("2012-08-03 16:30:00"),
        fields: BTreeMap::from([
            ("summary".to_string(), summary.to_string()),
            ("description".to_string(), format!("Description of {summary}")),
            ("reporter".to_string(), "butler".to_string()),
            ("owner".to_string(), "pkienzle".to_string()),
            ("milestone".to_string(), "SasView 4.0".to_string()),
            ("status".to_string(), "new".to_string()),
            ("type".to_string(), "defect".to_string()),
            ("priority".to_string(), "major".to_string()),
            ("workpackage".to_string(), String::new()),
        ]),
    }
}

pub(crate) fn with_field(mut ticket: SourceTicket, name: &str, value: &str) -> SourceTicket {
    ticket.fields.insert(name.to_string(), value.to_string());
    ticket
}

pub(crate) fn without_field(mut ticket: SourceTicket, name: &str) -> SourceTicket {
    ticket.fields.remove(name);
    ticket
}

pub(crate) fn entry(at: &str, author: &str, field: &str, old: &str, new: &str) -> ChangeLogEntry {
    ChangeLogEntry {
        time: time(at),
        author: author.to_string(),
        field: field.to_string(),
        old_value: old.to_string(),
        new_value: new.to_string(),
        permanent: true,
    }
}

/// Trac stand-in serving fixed queries, tickets and change logs.
#[derive(Default)]
pub(crate) struct FakeSource {
    queries: HashMap<String, Vec<u64>>,
    tickets: HashMap<u64, SourceTicket>,
    changelogs: HashMap<u64, Vec<ChangeLogEntry>>,
    failing_changelogs: HashSet<u64>,
    failing_queries: HashSet<String>,
    multicalls: AtomicUsize,
    changelog_requests: Mutex<Vec<u64>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serves `tickets` (in this order) for `query`.
    pub(crate) fn with_query(mut self, query: &str, tickets: Vec<SourceTicket>) -> Self {
        self.queries
            .insert(query.to_string(), tickets.iter().map(|t| t.id).collect());
        self.tickets
            .extend(tickets.into_iter().map(|ticket| (ticket.id, ticket)));
        self
    }

    pub(crate) fn with_changelog(mut self, id: u64, entries: Vec<ChangeLogEntry>) -> Self {
        self.changelogs.insert(id, entries);
        self
    }

    pub(crate) fn failing_changelog(mut self, id: u64) -> Self {
        self.failing_changelogs.insert(id);
        self
    }

    pub(crate) fn failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub(crate) fn multicall_count(&self) -> usize {
        self.multicalls.load(Ordering::SeqCst)
    }

    pub(crate) fn changelog_requests(&self) -> Vec<u64> {
        self.changelog_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceTracker for FakeSource {
    async fn search_ticket_ids(&self, query: &str) -> Result<Vec<u64>, TracError> {
        if self.failing_queries.contains(query) {
            return Err(TracError::Status {
                status: 500,
                body: "query failed".to_string(),
            });
        }
        Ok(self.queries.get(query).cloned().unwrap_or_default())
    }

    async fn get_tickets(&self, ids: &[u64]) -> Result<Vec<SourceTicket>, TracError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.multicalls.fetch_add(1, Ordering::SeqCst);
        ids.iter()
            .map(|id| {
                self.tickets.get(id).cloned().ok_or_else(|| TracError::Fault {
                    method: "ticket.get".to_string(),
                    code: 404,
                    message: format!("Ticket {id} does not exist."),
                })
            })
            .collect()
    }

    async fn get_changelog(&self, id: u64) -> Result<Vec<ChangeLogEntry>, TracError> {
        self.changelog_requests.lock().unwrap().push(id);
        if self.failing_changelogs.contains(&id) {
            return Err(TracError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self.changelogs.get(&id).cloned().unwrap_or_default())
    }

    async fn list_methods(&self) -> Result<Vec<String>, TracError> {
        Ok(vec!["system.listMethods".to_string(), "ticket.get".to_string()])
    }

    async fn method_help(&self, method: &str) -> Result<String, TracError> {
        Ok(format!("Help for {method}"))
    }
}

/// A comment recorded by [`FakeTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostedComment {
    pub number: u64,
    pub actor: String,
    pub body: String,
}

#[derive(Default)]
struct FakeRepository {
    milestones: Vec<Milestone>,
    labels: Vec<Label>,
    issues: Vec<TargetIssue>,
    comments: Vec<PostedComment>,
}

/// GitHub stand-in keeping repositories in memory and logging every write.
#[derive(Default)]
pub(crate) struct FakeTracker {
    repositories: Mutex<HashMap<String, FakeRepository>>,
    missing: HashSet<String>,
    writes: Mutex<Vec<String>>,
    failing_comments: Mutex<Vec<String>>,
}

impl FakeTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing issue; its number is taken as given.
    pub(crate) fn with_issue(self, repo: &str, issue: TargetIssue) -> Self {
        self.repositories
            .lock()
            .unwrap()
            .entry(repo.to_string())
            .or_default()
            .issues
            .push(issue);
        self
    }

    pub(crate) fn with_label(self, repo: &str, name: &str) -> Self {
        self.repositories
            .lock()
            .unwrap()
            .entry(repo.to_string())
            .or_default()
            .labels
            .push(Label {
                name: name.to_string(),
                color: "ededed".to_string(),
            });
        self
    }

    /// Seeds a comment left on an existing issue.
    pub(crate) fn with_comment(self, repo: &str, number: u64, actor: &str, body: &str) -> Self {
        self.repositories
            .lock()
            .unwrap()
            .entry(repo.to_string())
            .or_default()
            .comments
            .push(PostedComment {
                number,
                actor: actor.to_string(),
                body: body.to_string(),
            });
        self
    }

    /// Makes posting any comment containing `text` fail.
    pub(crate) fn failing_comment(self, text: &str) -> Self {
        self.failing_comments.lock().unwrap().push(text.to_string());
        self
    }

    pub(crate) fn stop_failing_comments(&self) {
        self.failing_comments.lock().unwrap().clear();
    }

    /// Makes every listing of `repo` fail as if it did not exist.
    pub(crate) fn missing_repository(mut self, repo: &str) -> Self {
        self.missing.insert(repo.to_string());
        self
    }

    pub(crate) fn issues(&self, repo: &str) -> Vec<TargetIssue> {
        self.read(repo, |r| r.issues.clone())
    }

    pub(crate) fn issue(&self, repo: &str, number: u64) -> Option<TargetIssue> {
        self.read(repo, |r| r.issues.iter().find(|i| i.number == number).cloned())
    }

    pub(crate) fn comments(&self, repo: &str) -> Vec<PostedComment> {
        self.read(repo, |r| r.comments.clone())
    }

    pub(crate) fn milestones(&self, repo: &str) -> Vec<Milestone> {
        self.read(repo, |r| r.milestones.clone())
    }

    pub(crate) fn labels(&self, repo: &str) -> Vec<Label> {
        self.read(repo, |r| r.labels.clone())
    }

    /// Every write so far, as `"<operation> <repo>[#<number>] as <actor>"`.
    pub(crate) fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    fn read<R>(&self, repo: &str, f: impl FnOnce(&FakeRepository) -> R) -> R {
        let mut repositories = self.repositories.lock().unwrap();
        f(repositories.entry(repo.to_string()).or_default())
    }

    fn write<R>(
        &self,
        log: String,
        repo: &str,
        f: impl FnOnce(&mut FakeRepository) -> Result<R, TrackerError>,
    ) -> Result<R, TrackerError> {
        self.writes.lock().unwrap().push(log);
        let mut repositories = self.repositories.lock().unwrap();
        f(repositories.entry(repo.to_string()).or_default())
    }

    fn check_exists(&self, repo: &str) -> Result<(), TrackerError> {
        if self.missing.contains(repo) {
            return Err(TrackerError::UnknownRepository {
                repository: format!("SasView/{repo}"),
            });
        }
        Ok(())
    }
}

fn find_issue<'a>(
    repository: &'a mut FakeRepository,
    repo: &str,
    number: u64,
) -> Result<&'a mut TargetIssue, TrackerError> {
    repository
        .issues
        .iter_mut()
        .find(|issue| issue.number == number)
        .ok_or_else(|| TrackerError::IssueNotFound {
            repository: repo.to_string(),
            number,
        })
}

#[async_trait]
impl TargetTracker for FakeTracker {
    async fn list_milestones(&self, repo: &str) -> Result<Vec<Milestone>, TrackerError> {
        self.check_exists(repo)?;
        Ok(self.milestones(repo))
    }

    async fn create_milestone(
        &self,
        repo: &str,
        actor: &str,
        title: &str,
    ) -> Result<Milestone, TrackerError> {
        self.write(format!("create_milestone {repo} as {actor}"), repo, |r| {
            let milestone = Milestone {
                number: r.milestones.len() as u64 + 1,
                title: title.to_string(),
            };
            r.milestones.push(milestone.clone());
            Ok(milestone)
        })
    }

    async fn list_labels(&self, repo: &str) -> Result<Vec<Label>, TrackerError> {
        self.check_exists(repo)?;
        Ok(self.labels(repo))
    }

    async fn create_label(
        &self,
        repo: &str,
        actor: &str,
        name: &str,
        color: &str,
    ) -> Result<Label, TrackerError> {
        self.write(format!("create_label {repo} as {actor}"), repo, |r| {
            let label = Label {
                name: name.to_string(),
                color: color.to_string(),
            };
            r.labels.push(label.clone());
            Ok(label)
        })
    }

    async fn list_issues(&self, repo: &str) -> Result<Vec<TargetIssue>, TrackerError> {
        self.check_exists(repo)?;
        Ok(self.issues(repo))
    }

    async fn create_issue(
        &self,
        repo: &str,
        actor: &str,
        issue: &NewIssue,
    ) -> Result<TargetIssue, TrackerError> {
        self.write(format!("create_issue {repo} as {actor}"), repo, |r| {
            let number = r.issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
            let created = TargetIssue {
                number,
                title: issue.title.clone(),
                body: issue.body.clone(),
                assignee: issue.assignee.clone(),
                labels: issue.labels.clone(),
                state: IssueState::Open,
                url: format!("https://github.com/SasView/{repo}/issues/{number}"),
            };
            r.issues.push(created.clone());
            Ok(created)
        })
    }

    async fn edit_issue(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        edit: &IssueEdit,
    ) -> Result<(), TrackerError> {
        self.write(format!("edit_issue {repo}#{number} as {actor}"), repo, |r| {
            let issue = find_issue(r, repo, number)?;
            if let Some(body) = &edit.body {
                issue.body.clone_from(body);
            }
            if let Some(assignee) = &edit.assignee {
                issue.assignee = Some(assignee.clone());
            }
            if let Some(state) = edit.state {
                issue.state = state;
            }
            Ok(())
        })
    }

    async fn list_comments(&self, repo: &str, number: u64) -> Result<Vec<String>, TrackerError> {
        self.check_exists(repo)?;
        Ok(self.read(repo, |r| {
            r.comments
                .iter()
                .filter(|comment| comment.number == number)
                .map(|comment| comment.body.clone())
                .collect()
        }))
    }

    async fn add_comment(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        body: &str,
    ) -> Result<(), TrackerError> {
        let failing = self
            .failing_comments
            .lock()
            .unwrap()
            .iter()
            .any(|text| body.contains(text.as_str()));
        self.write(format!("add_comment {repo}#{number} as {actor}"), repo, |r| {
            find_issue(r, repo, number)?;
            if failing {
                return Err(TrackerError::IssueNotFound {
                    repository: repo.to_string(),
                    number,
                });
            }
            r.comments.push(PostedComment {
                number,
                actor: actor.to_string(),
                body: body.to_string(),
            });
            Ok(())
        })
    }

    async fn remove_label(
        &self,
        repo: &str,
        actor: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError> {
        self.write(format!("remove_label {repo}#{number} as {actor}"), repo, |r| {
            let issue = find_issue(r, repo, number)?;
            issue.labels.retain(|name| name != label);
            Ok(())
        })
    }
}
