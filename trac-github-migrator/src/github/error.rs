//! GitHub tracker error types.

use crate::rate_limit::Retryable;
use thiserror::Error;

/// Errors that can occur during GitHub operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// No token is configured for the default account.
    #[error("No GitHub token configured for default account '{account}'")]
    MissingCredentials { account: String },

    /// The repository does not exist or is not visible to the token.
    #[error("Repository {repository} not found")]
    UnknownRepository { repository: String },

    /// The issue does not exist in the repository.
    #[error("Issue #{number} not found in {repository}")]
    IssueNotFound { repository: String, number: u64 },
}

impl Retryable for TrackerError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::GitHubError(octocrab::Error::GitHub { source, .. }) => {
                source.status_code.is_server_error() || source.status_code.as_u16() == 429
            }
            Self::GitHubError(octocrab::Error::Hyper { .. } | octocrab::Error::Http { .. }) => true,
            _ => false,
        }
    }
}

impl TrackerError {
    /// Maps a 404 from a repository-scoped listing to [`TrackerError::UnknownRepository`].
    pub(crate) fn for_repository(self, repository: String) -> Self {
        if self.is_not_found() {
            Self::UnknownRepository { repository }
        } else {
            self
        }
    }

    /// Maps a 404 from an issue-scoped call to [`TrackerError::IssueNotFound`].
    pub(crate) fn for_issue(self, repository: String, number: u64) -> Self {
        if self.is_not_found() {
            Self::IssueNotFound { repository, number }
        } else {
            self
        }
    }

    fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GitHubError(octocrab::Error::GitHub { source, .. })
                if source.status_code.as_u16() == 404
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_is_remapped() {
        let error = TrackerError::MissingCredentials {
            account: "sasview-bot".to_string(),
        };
        assert!(matches!(
            error.for_issue("SasView/sasview".to_string(), 7),
            TrackerError::MissingCredentials { .. }
        ));

        let error = TrackerError::IssueNotFound {
            repository: "SasView/sasview".to_string(),
            number: 7,
        };
        assert!(!error.is_retryable());
        assert_eq!(error.to_string(), "Issue #7 not found in SasView/sasview");
    }
}
