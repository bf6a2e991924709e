//! Contract call retry with exponential backoff.
//!
//! Transient network failures are retried with 2^n-second backoff,
//! capped at five minutes. Reverts and policy violations are never
//! retried: re-submitting a mutating call could double-spend, so only
//! read paths feed through this helper automatically.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Maximum retry attempts before giving up.
const MAX_RETRIES: u32 = 8;

/// Maximum backoff duration (5 minutes).
const MAX_BACKOFF_SECS: u64 = 300;

/// Retry an operation with exponential backoff.
///
/// `is_retryable` decides whether an error is transient; anything else
/// surfaces immediately. Returns the last error once retries are
/// exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    is_retryable: fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !is_retryable(&err) || attempt >= MAX_RETRIES {
                    return Err(err);
                }

                let backoff_secs = 2u64.pow(attempt).min(MAX_BACKOFF_SECS);
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_secs,
                    error = %err,
                    "transient contract failure, retrying"
                );

                sleep(Duration::from_secs(backoff_secs)).await;
                attempt += 1;
            }
        }
    }
}

/// Whether a contract error is transient.
///
/// Only network errors qualify; reverts and unknown-proposal errors are
/// deterministic and retrying them cannot help.
pub fn is_chain_error_retryable(err: &super::traits::ChainError) -> bool {
    matches!(err, super::traits::ChainError::Network(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::traits::ChainError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retry_succeeds_immediately() {
        let result = retry_with_backoff(
            || async { Ok::<_, ChainError>(42) },
            is_chain_error_retryable,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let attempt = Arc::new(AtomicU32::new(0));
        let attempt_clone = attempt.clone();

        let result = retry_with_backoff(
            move || {
                let attempt = attempt_clone.clone();
                async move {
                    if attempt.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ChainError::Network("rpc timeout".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            is_chain_error_retryable,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempt.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reverts_fail_immediately() {
        let attempt = Arc::new(AtomicU32::new(0));
        let attempt_clone = attempt.clone();

        let result = retry_with_backoff(
            move || {
                let attempt = attempt_clone.clone();
                async move {
                    attempt.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(ChainError::Reverted("bad call".to_string()))
                }
            },
            is_chain_error_retryable,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempt.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_classification() {
        assert!(is_chain_error_retryable(&ChainError::Network(
            "timeout".to_string()
        )));
        assert!(!is_chain_error_retryable(&ChainError::Reverted(
            "out of gas".to_string()
        )));
        assert!(!is_chain_error_retryable(&ChainError::Subscription(
            "closed".to_string()
        )));
    }
}
