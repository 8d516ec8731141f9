//! Fixed-delay retry policy.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

/// Default number of attempts, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default wait between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(60);

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never zero.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A policy that tries once.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Check if another attempt is allowed after `attempt` attempts.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Run `operation` until it succeeds, fails with an error `retryable`
    /// rejects, or the attempts are used up.
    ///
    /// `operation` receives the 1-based attempt number. The wait between
    /// attempts suspends the task; nothing spins.
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, mut operation: F, retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation = label, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if retryable(&e) && self.should_retry(attempt) => {
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay = ?self.delay,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if retryable(&e) {
                        error!(operation = label, attempts = attempt, error = %e, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}
