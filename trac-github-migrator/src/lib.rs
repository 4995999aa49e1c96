#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod github;
pub mod identity;
pub mod loader;
pub mod markup;
pub mod rate_limit;
pub mod runner;
pub mod summary;
pub mod taxonomy;
pub mod templates;
pub mod trac;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, MigrationConfig};
pub use github::{GitHubTracker, TargetIssue, TargetTracker, TrackerError};
pub use identity::{AccountResolver, ReferenceResolver, TicketMigrationMap};
pub use loader::load_all;
pub use markup::{make_blockquote, rewrite};
pub use rate_limit::{
    check_core_rate_limit, ensure_core_rate_limit, wait_duration, wait_if_needed, with_backoff,
    RateLimitInfo,
};
pub use runner::{list_rpc_methods, MigrationError, Runner, RunnerConfig, RunnerError};
pub use summary::{MigrationPass, RunSummary, TicketOutcome};
pub use taxonomy::TaxonomyCache;
pub use templates::{generate_issue_title, TemplateError, TemplateRenderer};
pub use trac::{SourceTicket, SourceTracker, TracClient, TracError};
