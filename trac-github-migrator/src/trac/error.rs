//! Trac RPC error types.

use crate::rate_limit::Retryable;
use thiserror::Error;

/// Errors that can occur while talking to the Trac RPC endpoint.
#[derive(Debug, Error)]
pub enum TracError {
    /// The RPC endpoint URL could not be derived from the configured Trac URL.
    #[error("Invalid Trac URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP transport error.
    #[error("Trac HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Trac RPC request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("Trac RPC response was malformed JSON: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },

    /// The RPC call itself reported a fault.
    #[error("Trac RPC fault in '{method}' ({code}): {message}")]
    Fault {
        method: String,
        code: i64,
        message: String,
    },

    /// The result did not have the shape the method is documented to return.
    #[error("Unexpected result from '{method}': {message}")]
    UnexpectedPayload { method: String, message: String },
}

impl TracError {
    pub(crate) fn unexpected(method: &str, message: impl Into<String>) -> Self {
        Self::UnexpectedPayload {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

impl Retryable for TracError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let error = TracError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(error.is_retryable());

        let error = TracError::Status {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert!(!error.is_retryable());
    }

    #[test]
    fn faults_are_not_retryable() {
        let error = TracError::Fault {
            method: "ticket.get".to_string(),
            code: 404,
            message: "Ticket 7 does not exist.".to_string(),
        };
        assert!(!error.is_retryable());
    }
}
