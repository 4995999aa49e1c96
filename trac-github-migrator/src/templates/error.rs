//! Template rendering error types.

/// Template rendering error.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Handlebars rendering error.
    #[error("Template rendering error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    /// Ticket fields could not be serialized for the issue body.
    #[error("Failed to serialize ticket fields: {0}")]
    FieldsError(#[from] serde_json::Error),
}
