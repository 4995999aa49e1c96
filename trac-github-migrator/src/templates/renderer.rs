//! Template renderer.

use crate::templates::TemplateError;
use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use serde_json::json;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;

/// Placeholder body of an issue created in pass one.
pub const ISSUE_BODY_TEMPLATE: &str = "Migrated from {{ticket_url}}\n```json\n{{fields}}\n```\n";

/// A Trac comment.
pub const COMMENT_TEMPLATE: &str = "**{{author}}** commented:\n\n{{text}}\n\n";

/// A field change where either value spans several lines.
pub const BLOCK_CHANGE_TEMPLATE: &str =
    "**{{author}}** changed {{field}} from:\n\n{{old}}\n\nto:\n\n{{new}}\n\n";

/// A single-line field change.
pub const INLINE_CHANGE_TEMPLATE: &str =
    "**{{author}}** changed {{field}} from \"{{old}}\" to \"{{new}}\"";

/// One posted comment covering every change made at once by one author.
pub const UPDATE_TEMPLATE: &str = "Trac update at `{{time}}`: {{update}}";

/// Creates a configured Handlebars registry.
///
/// The registry is configured with:
/// - No HTML escaping (for markdown output)
/// - Strict mode (catches missing variables)
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();

    // Disable HTML escaping for markdown output
    hbs.register_escape_fn(no_escape);

    // Enable strict mode to catch missing variables
    hbs.set_strict_mode(true);

    hbs
}

/// Renders issue bodies and history comments.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Creates a new template renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlebars: create_handlebars_registry(),
        }
    }

    /// Renders the pass-one body: a provenance link plus the raw ticket
    /// fields as 4-space-indented JSON. The fields are not rewritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields cannot be serialized or rendering fails.
    pub fn render_issue_body(
        &self,
        ticket_url: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<String, TemplateError> {
        let fields = indented_json(fields)?;
        self.render_template(
            ISSUE_BODY_TEMPLATE,
            &json!({ "ticket_url": ticket_url, "fields": fields }),
        )
    }

    /// Renders a comment entry; `text` is already converted to markdown.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_comment(&self, author: &str, text: &str) -> Result<String, TemplateError> {
        self.render_template(COMMENT_TEMPLATE, &json!({ "author": author, "text": text }))
    }

    /// Renders a field change; `old` and `new` are already block-quoted.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_block_change(
        &self,
        author: &str,
        field: &str,
        old: &str,
        new: &str,
    ) -> Result<String, TemplateError> {
        self.render_template(
            BLOCK_CHANGE_TEMPLATE,
            &json!({ "author": author, "field": field, "old": old, "new": new }),
        )
    }

    /// Renders a single-line field change.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_inline_change(
        &self,
        author: &str,
        field: &str,
        old: &str,
        new: &str,
    ) -> Result<String, TemplateError> {
        self.render_template(
            INLINE_CHANGE_TEMPLATE,
            &json!({ "author": author, "field": field, "old": old, "new": new }),
        )
    }

    /// Renders the comment posted for one `(time, author)` group.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_update(&self, time: &str, update: &str) -> Result<String, TemplateError> {
        self.render_template(UPDATE_TEMPLATE, &json!({ "time": time, "update": update }))
    }

    /// Renders a template with the given data.
    fn render_template<T: Serialize>(&self, template: &str, data: &T) -> Result<String, TemplateError> {
        Ok(self.handlebars.render_template(template, data)?)
    }
}

fn indented_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
