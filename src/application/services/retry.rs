//! # Conflict Retry
//!
//! Re-runs an optimistic read-modify-write operation when a concurrent
//! writer bumped a version first.
//!
//! Each attempt must re-read everything it writes; the policy only decides
//! whether and when to call it again. Errors other than version conflicts
//! are returned immediately.

use crate::application::error::{ApplicationError, ApplicationResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default attempt bound.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How many times to retry and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with linear backoff of `base_delay` per attempt.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Creates a policy that never waits between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Returns the attempt bound.
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt` (1-based; the first attempt never waits).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_sub(1))
    }

    /// Runs `operation` until it succeeds, fails with a non-conflict error,
    /// or the attempt bound is reached.
    ///
    /// # Errors
    ///
    /// - Any non-retryable error from `operation`, unchanged
    /// - `ApplicationError::Conflict` once every attempt hit a version conflict
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> ApplicationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApplicationResult<T>>,
    {
        for attempt in 1..=self.max_attempts {
            let delay = self.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match f().await {
                Err(err) if err.is_retryable() => {
                    debug!(operation, attempt, error = %err, "version conflict, retrying");
                }
                other => return other,
            }
        }
        warn!(
            operation,
            attempts = self.max_attempts,
            "giving up after repeated version conflicts"
        );
        Err(ApplicationError::conflict(operation, self.max_attempts))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_millis(5))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::RepositoryError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> ApplicationError {
        RepositoryError::version_conflict("Offer", "o-1", 1, 2).into()
    }

    #[tokio::test]
    async fn succeeds_after_transient_conflicts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = RetryPolicy::immediate(3)
            .run("op", || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(conflict())
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_with_conflict_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = RetryPolicy::immediate(4)
            .run("accept_offer", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(conflict())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Conflict { attempts: 4, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = RetryPolicy::immediate(5)
            .run("op", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApplicationError::forbidden("nope"))
            })
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn linear_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(20));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
