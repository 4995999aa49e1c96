//! Trac source tracker access.
//!
//! [`SourceTracker`] is the seam the migration engine reads tickets through.
//! [`TracClient`] implements it on top of the Trac RPC plugin's JSON-RPC
//! protocol; reads are retried with backoff since they are idempotent.

mod error;
mod rpc;
mod ticket;

pub use error::TracError;
pub use rpc::{HttpTransport, RpcTransport};
pub use ticket::{ChangeLogEntry, SourceTicket};

use crate::rate_limit::with_backoff;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use url::Url;

/// Read-only operations consumed from the source tracker.
#[async_trait]
pub trait SourceTracker: Send + Sync {
    /// Runs a Trac ticket query (e.g. `max=0&order=id&component=core`).
    async fn search_ticket_ids(&self, query: &str) -> Result<Vec<u64>, TracError>;

    /// Fetches several tickets in one round-trip, preserving the order of `ids`.
    async fn get_tickets(&self, ids: &[u64]) -> Result<Vec<SourceTicket>, TracError>;

    /// Fetches the full change log (field changes and comments) of a ticket.
    async fn get_changelog(&self, id: u64) -> Result<Vec<ChangeLogEntry>, TracError>;

    /// Lists the RPC methods the server exposes.
    async fn list_methods(&self) -> Result<Vec<String>, TracError>;

    /// Returns the help text of an RPC method.
    async fn method_help(&self, method: &str) -> Result<String, TracError>;
}

/// Client for the Trac RPC plugin.
pub struct TracClient<T = HttpTransport> {
    transport: T,
    next_id: AtomicU64,
}

impl TracClient<HttpTransport> {
    /// Builds a client for the Trac instance at `trac_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TracError`] if the HTTP transport cannot be built.
    pub fn new(trac_url: &Url) -> Result<Self, TracError> {
        let transport = HttpTransport::new(trac_url)?;
        debug!(endpoint = %transport.endpoint(), "Trac RPC client ready");
        Ok(Self::with_transport(transport))
    }
}

impl<T: RpcTransport> TracClient<T> {
    /// Builds a client over an arbitrary transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// Performs a single RPC call.
    async fn call(&self, method: &str, params: Value) -> Result<Value, TracError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "Trac RPC call");
        let response = self
            .transport
            .send(rpc::request_envelope(id, method, params))
            .await?;
        rpc::unwrap_envelope(method, response)
    }

    /// Performs several calls of `method` in a single `system.multicall` request.
    async fn multicall(&self, method: &str, calls: &[Value]) -> Result<Vec<Value>, TracError> {
        let signatures: Vec<Value> = calls
            .iter()
            .map(|params| json!({ "method": method, "params": params }))
            .collect();

        let result = self.call("system.multicall", json!([signatures])).await?;
        let Value::Array(slots) = result else {
            return Err(TracError::unexpected("system.multicall", "result is not an array"));
        };

        if slots.len() != calls.len() {
            return Err(TracError::unexpected(
                "system.multicall",
                format!("sent {} calls, got {} results", calls.len(), slots.len()),
            ));
        }

        slots
            .into_iter()
            .map(|slot| rpc::unwrap_multicall_slot(method, slot))
            .collect()
    }
}

#[async_trait]
impl<T: RpcTransport> SourceTracker for TracClient<T> {
    async fn search_ticket_ids(&self, query: &str) -> Result<Vec<u64>, TracError> {
        let result = with_backoff("ticket.query", move || {
            self.call("ticket.query", json!([query]))
        })
        .await?;
        rpc::parse_ids(result)
    }

    async fn get_tickets(&self, ids: &[u64]) -> Result<Vec<SourceTicket>, TracError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let calls: Vec<Value> = ids.iter().map(|id| json!([id])).collect();
        let calls = &calls;
        let results = with_backoff("ticket.get", move || self.multicall("ticket.get", calls))
            .await?;

        results.into_iter().map(rpc::parse_ticket).collect()
    }

    async fn get_changelog(&self, id: u64) -> Result<Vec<ChangeLogEntry>, TracError> {
        let result = with_backoff("ticket.changeLog", move || {
            self.call("ticket.changeLog", json!([id]))
        })
        .await?;
        rpc::parse_changelog(result)
    }

    async fn list_methods(&self) -> Result<Vec<String>, TracError> {
        let result = self.call("system.listMethods", json!([])).await?;
        let Value::Array(methods) = result else {
            return Err(TracError::unexpected("system.listMethods", "result is not an array"));
        };
        Ok(methods
            .into_iter()
            .filter_map(|m| m.as_str().map(str::to_string))
            .collect())
    }

    async fn method_help(&self, method: &str) -> Result<String, TracError> {
        let result = self.call("system.methodHelp", json!([method])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TracError::unexpected("system.methodHelp", "result is not a string"))
    }
}

/// Returns `url` with any embedded credentials removed.
#[must_use]
pub fn public_url(url: &Url) -> Url {
    let mut public = url.clone();
    // Only fails for URLs that cannot carry credentials in the first place.
    let _ = public.set_username("");
    let _ = public.set_password(None);
    public
}

/// Returns the public link of a Trac ticket.
#[must_use]
pub fn ticket_url(public_url: &Url, id: u64) -> String {
    public_url
        .join(&format!("/ticket/{id}"))
        .map_or_else(
            |_| format!("{}/ticket/{id}", public_url.as_str().trim_end_matches('/')),
            |url| url.to_string(),
        )
}
