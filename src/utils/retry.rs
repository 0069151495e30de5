use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::warn;

use crate::BackoffPolicy;
use crate::Result;
use crate::SystemError;

/// Uniform random delay in [min_ms, max_ms); collapses to `min_ms` when the
/// range is empty.
pub(crate) fn jittered_delay(
    min_ms: u64,
    max_ms: u64,
) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    let ms = rand::thread_rng().gen_range(min_ms..max_ms);
    Duration::from_millis(ms)
}

/// General bounded retry for background operations.
///
/// Attempts the task up to `policy.max_retries` times (at least once) with a
/// jittered sleep between attempts; the final failure is surfaced as
/// [`SystemError::TaskBackoffFailed`].
pub(crate) async fn retry_with_backoff<F, T, P>(
    op_name: &str,
    policy: BackoffPolicy,
    task: F,
) -> Result<P>
where
    F: Fn() -> T,
    T: std::future::Future<Output = Result<P>>,
{
    let max_attempts = policy.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match task().await {
            Ok(r) => return Ok(r),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    warn!("{} failed after {} attempts: {:?}", op_name, attempt, e);
                    return Err(SystemError::TaskBackoffFailed(format!(
                        "{} failed after {} attempts: {}",
                        op_name, attempt, e
                    ))
                    .into());
                }
                warn!("{} attempt {} failed: {:?}", op_name, attempt, e);
                sleep(jittered_delay(policy.min_delay_ms, policy.max_delay_ms)).await;
            }
        }
    }
}
