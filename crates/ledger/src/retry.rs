// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReadRetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Upper bound for a single attempt
    pub attempt_timeout: Duration,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

/// Bound `fut` by `limit`. Elapsing counts as the ledger being unreachable.
pub async fn with_deadline<T, Fut>(
    operation_name: &str,
    limit: Duration,
    fut: Fut,
) -> Result<T, LedgerError>
where
    Fut: Future<Output = Result<T, LedgerError>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::timed_out(operation_name, limit.as_millis())),
    }
}

/// Run a read-only ledger call, retrying with exponential backoff while the failure is
/// retryable. Must never wrap a signing call.
pub async fn call_with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &ReadRetryPolicy,
    read_fn: F,
) -> Result<T, LedgerError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempts += 1;
        match with_deadline(operation_name, policy.attempt_timeout, read_fn()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempts < max_attempts => {
                info!(
                    "{}: error (attempt {}/{}), will retry after {}ms: {}",
                    operation_name,
                    attempts,
                    max_attempts,
                    delay.as_millis(),
                    e
                );
                sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(max_attempts: u32) -> ReadRetryPolicy {
        ReadRetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            attempt_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = call_with_retry("getAllContentIds", &policy(3), || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(LedgerError::Unreachable("connection reset".into()))
                } else {
                    Ok(7u32)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), _> = call_with_retry("isAvailable", &policy(2), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LedgerError::Unreachable("connection refused".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(LedgerError::Unreachable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), _> = call_with_retry("getContentData", &policy(5), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LedgerError::CallReverted("unknown content".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(LedgerError::CallReverted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out_as_unreachable() {
        let result: Result<(), _> = call_with_retry("getEncryptedValue", &policy(1), || async {
            sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;

        let Err(LedgerError::Unreachable(msg)) = result else {
            panic!("expected a timeout");
        };
        assert!(msg.contains("timed out after 1000ms"));
    }
}
