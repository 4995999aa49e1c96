//! Trac ticket snapshots and history entries.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// A Trac ticket as loaded at the start of the run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceTicket {
    /// Trac ticket number.
    pub id: u64,

    /// When the ticket was created (UTC).
    pub created: NaiveDateTime,

    /// When the ticket was last modified (UTC).
    pub changed: NaiveDateTime,

    /// Raw ticket attributes (summary, description, owner, ...).
    pub fields: BTreeMap<String, String>,
}

impl SourceTicket {
    /// Returns the value of a ticket attribute, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns the value of an attribute only when it is present and not blank.
    #[must_use]
    pub fn non_empty_field(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|value| !value.trim().is_empty())
    }
}

/// One entry of a ticket's change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogEntry {
    /// When the change happened (UTC).
    pub time: NaiveDateTime,

    /// Trac user that made the change.
    pub author: String,

    /// Changed field, or `comment` for comments.
    pub field: String,

    /// Previous value.
    pub old_value: String,

    /// New value (the comment text for comments).
    pub new_value: String,

    /// Whether Trac stores the change permanently.
    pub permanent: bool,
}

impl ChangeLogEntry {
    /// Returns true if this entry is a comment rather than a field change.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.field == "comment"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> SourceTicket {
        let time = NaiveDateTime::parse_from_str("2011-03-04T05:06:07", "%Y-%m-%dT%H:%M:%S")
            .unwrap();
        SourceTicket {
            id: 3,
            created: time,
            changed: time,
            fields: BTreeMap::from([
                ("summary".to_string(), "Crash".to_string()),
                ("milestone".to_string(), "  ".to_string()),
            ]),
        }
    }

    #[test]
    fn blank_fields_are_not_reported_as_set() {
        let ticket = ticket();
        assert_eq!(ticket.field("milestone"), Some("  "));
        assert_eq!(ticket.non_empty_field("milestone"), None);
        assert_eq!(ticket.non_empty_field("summary"), Some("Crash"));
        assert_eq!(ticket.field("owner"), None);
    }
}
