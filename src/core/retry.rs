//! Retry with exponential backoff
//!
//! The backoff delay is a pure function of the attempt number; the sleeper
//! is injected so retry behavior is testable without real timers.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::s3::S3Result;

/// Default number of attempts per operation (1 initial + 2 retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry policy applied to every store call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Double the delay after each failed attempt
    pub exponential: bool,

    /// Add up to 50% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(500),
            exponential: true,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            exponential: false,
            jitter: false,
        }
    }
}

/// Delay before the retry following `attempt` (1-based)
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    if policy.exponential {
        policy.base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1))
    } else {
        policy.base_delay
    }
}

/// Run `op` with retries per `policy`, sleeping with tokio's timer.
///
/// Returns the final result and the number of attempts made. Only errors
/// classified retryable are retried; anything else propagates immediately.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, op: F) -> (S3Result<T>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = S3Result<T>>,
{
    with_backoff_using(policy, tokio::time::sleep, op).await
}

/// Same as [`with_backoff`] but with an injected sleeper
pub async fn with_backoff_using<T, F, Fut, S, SFut>(
    policy: &RetryPolicy,
    sleep: S,
    mut op: F,
) -> (S3Result<T>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = S3Result<T>>,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return (Ok(value), attempt),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let mut delay = backoff_delay(policy, attempt);
                if policy.jitter && !delay.is_zero() {
                    let extra = rand::rng().random_range(0..=delay.as_millis() as u64 / 2);
                    delay += Duration::from_millis(extra);
                }

                debug!(
                    attempt,
                    max = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient error, retrying"
                );

                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return (Err(e), attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::S3Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy_no_jitter() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            exponential: true,
            jitter: false,
        }
    }

    async fn no_sleep(_: Duration) {}

    #[test]
    fn test_backoff_delay_doubles() {
        let policy = policy_no_jitter();
        assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(&policy, 3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_delay_fixed() {
        let policy = RetryPolicy {
            exponential: false,
            ..policy_no_jitter()
        };
        assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(&policy, 5), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let (result, attempts) = with_backoff_using(&policy_no_jitter(), no_sleep, || async {
            Ok::<_, S3Error>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_transient_error_under_limit_succeeds() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = with_backoff_using(&policy_no_jitter(), no_sleep, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(S3Error::Timeout("slow".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_transient_error_beyond_limit_fails() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = with_backoff_using(&policy_no_jitter(), no_sleep, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(S3Error::Network("reset".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_propagates_immediately() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = with_backoff_using(&policy_no_jitter(), no_sleep, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(S3Error::AccessDenied("nope".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(S3Error::AccessDenied(_))));
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
