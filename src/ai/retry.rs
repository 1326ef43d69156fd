//! Bounded retry with exponential backoff and a hard per-attempt timeout.

use crate::config::RetryPolicy;
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tracing::warn;

/// Delays between attempts: `base_delay * 2^i` after the i-th failure.
pub fn backoff(policy: RetryPolicy) -> impl Iterator<Item = Duration> {
    (0..policy.retries).map(move |i| policy.base_delay.saturating_mul(2u32.saturating_pow(i)))
}

/// Run `op` up to `retries + 1` times.
///
/// Each attempt races the operation against `attempt_timeout`; the losing
/// future is dropped. Only transient errors are retried.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T>> + Send,
    T: Send,
{
    let total = policy.retries + 1;
    let mut attempt = 0u32;

    RetryIf::spawn(
        backoff(policy),
        || {
            attempt += 1;
            let current = attempt;
            let call = op();
            async move {
                match tokio::time::timeout(policy.attempt_timeout, call).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => {
                        warn!("[{}] attempt {}/{} failed: {}", label, current, total, e);
                        Err(e)
                    }
                    Err(_) => {
                        warn!(
                            "[{}] attempt {}/{} timed out after {:?}",
                            label, current, total, policy.attempt_timeout
                        );
                        Err(Error::Timeout(policy.attempt_timeout))
                    }
                }
            }
        },
        |e: &Error| e.is_transient(),
    )
    .await
}
