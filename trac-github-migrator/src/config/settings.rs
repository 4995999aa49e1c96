//! `migration.toml` deserialization.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Parsed contents of a `migration.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MigrationConfig {
    /// Source tracker settings.
    #[serde(default)]
    pub trac: TracSettings,

    /// Target tracker settings.
    pub github: GitHubSettings,

    /// Trac username to GitHub login table.
    #[serde(default)]
    pub usernames: BTreeMap<String, String>,

    /// Repositories to migrate into, in reference-resolution order.
    #[serde(default)]
    pub repositories: Vec<RepositorySettings>,
}

/// `[trac]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TracSettings {
    /// Base URL of the Trac instance; may embed basic-auth credentials.
    /// Falls back to the `TRAC_URL` environment variable.
    pub url: Option<String>,
}

/// `[github]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubSettings {
    /// Organisation (or user) owning the target repositories.
    pub organisation: String,

    /// Account used for taxonomy writes and for every unresolved Trac user.
    pub default_account: String,

    /// Checkpoint label attached in pass one and removed in pass two.
    #[serde(default = "default_marker_label")]
    pub marker_label: String,

    /// Label attached to every migrated issue.
    #[serde(default = "default_migrated_label")]
    pub migrated_label: String,

    /// Ticket fields whose values become labels.
    #[serde(default = "default_label_fields")]
    pub label_fields: Vec<String>,

    /// Personal access token per GitHub account.
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

/// One `[[repositories]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositorySettings {
    /// Repository name within the organisation.
    pub name: String,

    /// Trac ticket query selecting the tickets for this repository.
    pub query: String,
}

pub fn default_marker_label() -> String {
    "Incomplete Migration".to_string()
}

pub fn default_migrated_label() -> String {
    "Migrated from Trac".to_string()
}

pub fn default_label_fields() -> Vec<String> {
    ["type", "workpackage", "priority"]
        .into_iter()
        .map(str::to_string)
        .collect()
}
