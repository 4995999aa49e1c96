//! Runner configuration.

use std::path::{Path, PathBuf};

/// Default number of repositories processed at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Configuration for a migration run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path to `migration.toml`.
    config_path: PathBuf,
    /// Token for the default account, if not in the config file.
    token: Option<String>,
    /// Whether to preview the run without writing to GitHub.
    dry_run: bool,
    /// Maximum repositories processed concurrently.
    concurrency: usize,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(
        config_path: PathBuf,
        token: Option<String>,
        dry_run: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            config_path,
            token,
            dry_run,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns the `migration.toml` path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the default account token given on the command line.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the max repositories processed concurrently.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("migration.toml"), None, false, DEFAULT_CONCURRENCY)
    }
}
