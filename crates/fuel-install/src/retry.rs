//! Retry policy with exponential backoff
//!
//! Service calls retry on [`InstallError::should_retry`] and file downloads
//! on [`FileError::is_transient`]. Integrity failures never go through this
//! path; they have their own budgets in [`InstallConfig`](crate::InstallConfig).

use crate::error::{FileError, InstallError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Errors that can tell whether trying again may help
pub trait Retryable {
    /// True when the same request may succeed later
    fn is_retryable(&self) -> bool;
}

impl Retryable for InstallError {
    fn is_retryable(&self) -> bool {
        self.should_retry()
    }
}

impl Retryable for FileError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// How often and how patiently to repeat a failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_backoff: Duration,

    /// Upper bound of any delay
    pub max_backoff: Duration,

    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero based)
    #[allow(clippy::cast_precision_loss)]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let nanos = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exponent);
        if nanos.is_finite() && nanos >= 0.0 && nanos < self.max_backoff.as_nanos() as f64 {
            Duration::from_nanos(nanos.round() as u64)
        } else {
            self.max_backoff
        }
    }

    /// Run `f` until it succeeds, fails for good, or the retries run out
    pub async fn execute<F, Fut, T, E>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut retry = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || retry >= self.max_retries => return Err(e),
                Err(e) => {
                    let delay = self.backoff(retry);
                    retry += 1;
                    warn!(
                        operation,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
