//! Rate limiting and retry utilities for remote APIs.
//!
//! Every GitHub account used as an author has its own core rate limit, so
//! writes check the limit of the client that is about to act and wait for
//! its window to reset when it runs low. Idempotent reads against either
//! tracker go through [`with_backoff`].

mod backoff;
mod info;

pub use backoff::{with_backoff, Retryable, INITIAL_BACKOFF, MAX_ATTEMPTS};
pub use info::RateLimitInfo;

use octocrab::Octocrab;
use std::time::Duration;
use tracing::{info, warn};

/// Longest single wait for a window reset (1 hour).
const MAX_WAIT_SECS: u64 = 3600;

/// Below this many remaining requests, writes wait for the reset.
const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Reads the core API limit of `octocrab`.
///
/// # Errors
///
/// Returns an error if the rate limit API call fails.
pub async fn check_core_rate_limit(octocrab: &Octocrab) -> Result<RateLimitInfo, octocrab::Error> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let core = &rate_limit.resources.core;

    Ok(RateLimitInfo {
        remaining: core.remaining as u32,
        reset: core.reset,
        limit: core.limit as u32,
    })
}

/// Returns how long to pause before the next write, if at all.
#[must_use]
pub fn wait_duration(info: &RateLimitInfo) -> Option<Duration> {
    if info.remaining >= MIN_REMAINING_THRESHOLD {
        return None;
    }

    let wait_secs = info.seconds_until_reset()?;
    if wait_secs > MAX_WAIT_SECS {
        warn!(
            wait_secs,
            max_wait = MAX_WAIT_SECS,
            "Rate limit reset too far in future, capping wait time"
        );
    }
    Some(Duration::from_secs(wait_secs.min(MAX_WAIT_SECS)))
}

/// Sleeps until `account`'s window resets when it is nearly exhausted.
///
/// Returns true if it waited.
pub async fn wait_if_needed(account: &str, info: &RateLimitInfo) -> bool {
    let Some(wait) = wait_duration(info) else {
        return false;
    };

    info!(
        account,
        remaining = info.remaining,
        limit = info.limit,
        wait_secs = wait.as_secs(),
        "Rate limit low, waiting for reset"
    );
    tokio::time::sleep(wait).await;
    true
}

/// Makes sure `account` has core API budget left before a write.
///
/// # Errors
///
/// Returns an error if the rate limit check fails.
pub async fn ensure_core_rate_limit(
    octocrab: &Octocrab,
    account: &str,
) -> Result<(), octocrab::Error> {
    let info = check_core_rate_limit(octocrab).await?;
    wait_if_needed(account, &info).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn plenty_remaining_needs_no_wait() {
        let info = RateLimitInfo {
            remaining: 100,
            reset: now() + 600,
            limit: 5000,
        };
        assert_eq!(wait_duration(&info), None);
    }

    #[test]
    fn wait_is_capped_at_one_hour() {
        let info = RateLimitInfo {
            remaining: 0,
            reset: now() + 4 * MAX_WAIT_SECS,
            limit: 5000,
        };
        assert_eq!(
            wait_duration(&info),
            Some(Duration::from_secs(MAX_WAIT_SECS))
        );
    }

    #[tokio::test]
    async fn no_wait_once_reset_passed() {
        let info = RateLimitInfo {
            remaining: 1,
            reset: 0,
            limit: 5000,
        };

        let waited = wait_if_needed("sasview-bot", &info).await;
        assert!(!waited);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_reset_when_low() {
        let info = RateLimitInfo {
            remaining: 1,
            reset: now() + 30,
            limit: 5000,
        };

        let waited = wait_if_needed("butlerpd", &info).await;
        assert!(waited);
    }
}
