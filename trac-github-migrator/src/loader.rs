//! Per-repository ticket loading.

use crate::trac::{SourceTicket, SourceTracker, TracError};
use tracing::{debug, info};

/// Loads every ticket matched by a Trac `query`, in query order.
///
/// The ids come from one `ticket.query` call and the tickets from a single
/// batched fetch. An empty query result makes no second request.
///
/// # Errors
///
/// Returns [`TracError`] if the query fails or any ticket cannot be fetched.
pub async fn load_all<S: SourceTracker + ?Sized>(
    source: &S,
    query: &str,
) -> Result<Vec<SourceTicket>, TracError> {
    let ids = source.search_ticket_ids(query).await?;
    debug!(query, count = ids.len(), "Trac query returned tickets");

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let tickets = source.get_tickets(&ids).await?;
    info!(query, count = tickets.len(), "Loaded Trac tickets");
    Ok(tickets)
}
