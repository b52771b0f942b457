//! Bounded retries for remote reads.
//!
//! Every get-method call the client makes goes through [`RetryPolicy::run`].
//! Wallet submissions never do: a repeated `sendTransaction` could sign and
//! broadcast twice.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_DELAY_MS: u64 = 2_000;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ProviderError {
    /// Only transport failures are transient; an exit code or a malformed
    /// stack will repeat on every attempt.
    fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }
}

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    Fixed { delay_ms: u64 },
    /// `base * 2^(attempt-1)`, capped at `max_ms`.
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential { base_ms, max_ms } => {
                let shift = attempt.saturating_sub(1).min(63);
                let ms = base_ms.saturating_mul(1u64 << shift).min(max_ms);
                Duration::from_millis(ms)
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Fixed {
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
        }
    }
}

/// Receives every swallowed intermediate failure.
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, label: &str, attempt: u32, max_attempts: u32, delay: Duration, error: &dyn fmt::Display);
}

/// Logs intermediate failures at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, label: &str, attempt: u32, max_attempts: u32, delay: Duration, error: &dyn fmt::Display) {
        tracing::warn!(
            "{} attempt {}/{} failed: {}. Retrying in {:?}",
            label,
            attempt,
            max_attempts,
            error,
            delay
        );
    }
}

#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    observer: Arc<dyn RetryObserver>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    let delay = self.config.backoff.delay(attempt);
                    self.observer
                        .on_retry(label, attempt, max_attempts, delay, &e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
