//! Bounded retry with a fixed pause between attempts.
//!
//! Every call the client makes to the backend goes through here. A transport
//! failure and a non-2xx status are both treated as a failed attempt; the raw
//! response is handed back untouched on success.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed pause before each retry. Not scaled by attempt number.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request to {target} failed after {attempts} attempt(s): {source}")]
    Exhausted {
        target: String,
        attempts: u32,
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// The error from the final attempt, with any `Exhausted` wrapping removed.
    pub fn last_failure(&self) -> &FetchError {
        match self {
            FetchError::Exhausted { source, .. } => source.last_failure(),
            other => other,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self.last_failure() {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
            FetchError::Exhausted { .. } => None,
        }
    }
}

/// Runs `op` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `target` only labels diagnostics and the final error.
pub async fn retry<T, F, Fut>(
    target: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max => {
                return Err(FetchError::Exhausted {
                    target: target.to_string(),
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                warn!("Retrying {target} ({attempt}/{max}): {e}");
                tokio::time::sleep(policy.base_delay).await;
            }
        }
    }
}

/// Sends the request built by `build` with retry, failing on any non-2xx status.
///
/// The builder is invoked once per attempt because multipart bodies cannot be
/// replayed.
pub async fn send_with_retry<F>(
    target: &str,
    policy: &RetryPolicy,
    build: F,
) -> Result<reqwest::Response, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    retry(target, policy, || async { ensure_success(build().send().await?) }).await
}

/// Converts a non-2xx response into `FetchError::Status`.
pub fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }
    Ok(response)
}
