//! Trac ticket id to GitHub issue mapping for one repository.

use crate::github::TargetIssue;
use crate::runner::MigrationError;
use std::collections::BTreeMap;

/// Per-repository map from Trac ticket id to the issue it migrated to.
///
/// Entries are write-once: recording the same issue again is a no-op, while
/// a different issue for a known id, or a second id for a known issue, is
/// rejected.
#[derive(Debug, Clone, Default)]
pub struct TicketMigrationMap {
    issues: BTreeMap<u64, TargetIssue>,
    tickets_by_issue: BTreeMap<u64, u64>,
}

impl TicketMigrationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the issue recorded for a ticket.
    #[must_use]
    pub fn get(&self, ticket: u64) -> Option<&TargetIssue> {
        self.issues.get(&ticket)
    }

    /// Records that `ticket` migrated to `issue`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::ConflictingMapping`] if either side is
    /// already mapped to something else.
    pub fn record(&mut self, ticket: u64, issue: TargetIssue) -> Result<(), MigrationError> {
        if let Some(existing) = self.issues.get(&ticket) {
            if existing.number == issue.number {
                return Ok(());
            }
            return Err(MigrationError::ConflictingMapping {
                ticket,
                issue: issue.number,
                reason: format!("already mapped to issue #{}", existing.number),
            });
        }

        if let Some(other) = self.tickets_by_issue.get(&issue.number) {
            return Err(MigrationError::ConflictingMapping {
                ticket,
                issue: issue.number,
                reason: format!("issue already claimed by ticket #{other}"),
            });
        }

        self.tickets_by_issue.insert(issue.number, ticket);
        self.issues.insert(ticket, issue);
        Ok(())
    }

    /// Iterates over `(ticket id, issue)` pairs in ticket order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &TargetIssue)> {
        self.issues.iter().map(|(id, issue)| (*id, issue))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::IssueState;

    fn issue(number: u64) -> TargetIssue {
        TargetIssue {
            number,
            title: format!("Issue {number}"),
            body: String::new(),
            assignee: None,
            labels: Vec::new(),
            state: IssueState::Open,
            url: format!("https://github.com/SasView/sasview/issues/{number}"),
        }
    }

    #[test]
    fn recording_same_issue_twice_is_noop() {
        let mut map = TicketMigrationMap::new();
        map.record(12, issue(5)).unwrap();
        map.record(12, issue(5)).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(12).map(|i| i.number), Some(5));
    }

    #[test]
    fn rejects_remapping_a_ticket() {
        let mut map = TicketMigrationMap::new();
        map.record(12, issue(5)).unwrap();

        let result = map.record(12, issue(6));
        assert!(matches!(
            result,
            Err(MigrationError::ConflictingMapping { ticket: 12, issue: 6, .. })
        ));
        assert_eq!(map.get(12).map(|i| i.number), Some(5));
    }

    #[test]
    fn rejects_two_tickets_on_one_issue() {
        let mut map = TicketMigrationMap::new();
        map.record(12, issue(5)).unwrap();

        assert!(map.record(13, issue(5)).is_err());
        assert!(map.get(13).is_none());
    }
}
