//! Rate limit information.

use std::time::{SystemTime, UNIX_EPOCH};

/// Rate limit information for the GitHub core API.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,

    /// Unix timestamp when the rate limit resets.
    pub reset: u64,

    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// Seconds until the window resets, or `None` if it already has.
    #[must_use]
    pub fn seconds_until_reset(&self) -> Option<u64> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.reset.checked_sub(now).filter(|secs| *secs > 0)
    }
}
