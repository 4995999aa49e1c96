//! Issue and comment rendering using Handlebars.

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{create_handlebars_registry, TemplateRenderer};

/// Generates the issue title for a Trac ticket.
///
/// Format: "{summary} (Trac #{id})". The embedded id is what lets a later
/// run find the issue again by title.
#[must_use]
pub fn generate_issue_title(summary: &str, id: u64) -> String {
    format!("{summary} (Trac #{id})")
}
