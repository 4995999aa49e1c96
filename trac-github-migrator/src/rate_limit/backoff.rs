//! Retry with exponential backoff for idempotent reads.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempts made before giving up, including the first one.
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubled for every further retry.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Errors that know whether repeating the request can succeed.
pub trait Retryable {
    /// Returns true for transient failures (timeouts, 5xx, rate limiting).
    fn is_retryable(&self) -> bool;
}

/// Runs `attempt` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only use this for reads: a retried write may have been applied already.
///
/// # Errors
///
/// Returns the last error produced by `attempt`.
pub async fn with_backoff<T, E, F, Fut>(operation: &str, mut attempt: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut delay = INITIAL_BACKOFF;
    let mut attempts = 1;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if attempts < MAX_ATTEMPTS && e.is_retryable() => {
                warn!(
                    operation,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempts += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "transient={}", self.transient)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.transient
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures() {
        let calls = &AtomicU32::new(0);

        let result = with_backoff("test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(TestError { transient: true })
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = with_backoff("test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError { transient: true })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = with_backoff("test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError { transient: false })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
