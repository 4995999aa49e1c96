//! GitHub issue, milestone and label handles.

use serde::Serialize;

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

/// A GitHub issue as last seen by this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetIssue {
    /// Issue number, assigned by GitHub.
    pub number: u64,

    /// Issue title.
    pub title: String,

    /// Issue body (markdown).
    pub body: String,

    /// Login of the assignee, if any.
    pub assignee: Option<String>,

    /// Names of the attached labels.
    pub labels: Vec<String>,

    /// Open/closed state.
    pub state: IssueState,

    /// Browser URL of the issue.
    pub url: String,
}

impl TargetIssue {
    /// Returns true if a label with exactly this name is attached.
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label == name)
    }
}

/// A repository milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    /// Milestone number used when assigning issues.
    pub number: u64,

    /// Milestone title.
    pub title: String,
}

/// A repository label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    /// Label name.
    pub name: String,

    /// Hex colour without the leading `#`.
    pub color: String,
}

/// Parameters for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub assignee: Option<String>,
    pub milestone: Option<u64>,
    pub labels: Vec<String>,
}

/// A partial issue update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueEdit {
    pub body: Option<String>,
    pub assignee: Option<String>,
    pub state: Option<IssueState>,
}

impl IssueEdit {
    /// An edit replacing only the body.
    #[must_use]
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// An edit replacing only the assignee.
    #[must_use]
    pub fn assignee(login: impl Into<String>) -> Self {
        Self {
            assignee: Some(login.into()),
            ..Self::default()
        }
    }

    /// An edit changing only the state.
    #[must_use]
    pub fn state(state: IssueState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}
