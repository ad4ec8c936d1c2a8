//! Retry loop for upstream calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::Policy;
use crate::error::{GovernorError, Result};

/// Attempts, spacing and per-attempt deadline for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1
    pub attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            attempts: policy.max_retries.max(1),
            delay: Duration::from_millis(policy.retry_delay),
            timeout: Duration::from_millis(policy.request_timeout),
        }
    }
}

/// Runs `f` until it succeeds, the attempts run out, or `may_retry` says no.
///
/// Each attempt is cut off after `retry.timeout` and reported as
/// [`GovernorError::Timeout`].
pub(crate) async fn with_retry<F, Fut, T, P>(f: F, retry: RetryPolicy, may_retry: P) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn() -> bool,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        debug!("Attempt {} of {}", attempts, retry.attempts);

        let outcome = match timeout(retry.timeout, f()).await {
            Ok(result) => result,
            Err(_) => Err(GovernorError::Timeout(retry.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(value) => {
                if attempts > 1 {
                    info!("Upstream call succeeded after {} attempts", attempts);
                }
                return Ok(value);
            }
            Err(e) => {
                if attempts >= retry.attempts {
                    warn!("Upstream call failed after {} attempts: {}", attempts, e);
                    return Err(e);
                }
                if !may_retry() {
                    warn!("Upstream call failed, retry not permitted: {}", e);
                    return Err(e);
                }
                warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempts, e, retry.delay
                );
                sleep(retry.delay).await;
            }
        }
    }
}
