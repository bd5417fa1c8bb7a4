//! Timeout and retry wrappers for page operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! navigation, plus a bounded exponential backoff for transient failures.

use anyhow::Result;
use log::warn;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::utils::MAX_BACKOFF_MS;

/// Wrap an async page operation with an explicit timeout
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - Either the operation failed or the timeout was reached
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {} ms",
            timeout.as_millis()
        )),
    }
}

/// Retry `f` up to `max_retries` extra times with exponential backoff.
///
/// Delay before retry `n` (0-based) is `2^n` seconds, capped at
/// [`MAX_BACKOFF_MS`], plus up to one second of jitter. With
/// `max_retries == 0` the first error is returned as is.
pub async fn retry_with_backoff<F, Fut, T>(f: F, max_retries: u32) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if retries >= max_retries {
                    return Err(e);
                }

                let delay = backoff_ms(retries) + rand::rng().random_range(0..1000);
                warn!(
                    target: "realty_ingest::crawl",
                    "Attempt {}/{} failed, retrying in {}ms: {e:#}",
                    retries + 1,
                    max_retries + 1,
                    delay
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                retries += 1;
            }
        }
    }
}

/// Exponential base delay for retry `n`, saturating at [`MAX_BACKOFF_MS`].
fn backoff_ms(retry: u32) -> u64 {
    1000u64
        .checked_shl(retry)
        .filter(|ms| ms >> retry == 1000)
        .map_or(MAX_BACKOFF_MS, |ms| ms.min(MAX_BACKOFF_MS))
}
