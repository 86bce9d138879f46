//! Bounded, blocking retry with linear backoff for remote model calls.
//!
//! Only transient overload failures are retried. The dispatcher never
//! returns an error: callers get `Some(result)` or `None`.

use std::time::Duration;

use super::{FailureKind, LlmError};

/// Default attempt budget per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff base. The n-th wait is `base * n`.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one call.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

/// Blocking wait between attempts (swappable in tests).
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct RetryDispatcher {
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper + Send + Sync>,
}

impl RetryDispatcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Box::new(ThreadSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Box<dyn Sleeper + Send + Sync>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Invoke `call` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// `operation` labels the call in logs.
    pub fn dispatch<T, F>(&self, operation: &str, mut call: F) -> Option<T>
    where
        F: FnMut() -> Result<T, LlmError>,
    {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let err = match call() {
                Ok(value) => return Some(value),
                Err(err) => err,
            };

            tracing::warn!(operation, attempt, error = %err, "Model call failed");

            if err.kind() == FailureKind::Permanent {
                tracing::error!(operation, attempt, "Model call failed permanently, not retrying");
                return None;
            }

            if attempt == max_attempts {
                break;
            }

            let delay = self.policy.delay_after(attempt);
            tracing::info!(
                operation,
                attempt,
                delay_secs = delay.as_secs_f64(),
                "Model overloaded, backing off"
            );
            self.sleeper.sleep(delay);
        }

        tracing::error!(operation, attempts = max_attempts, "Model call failed after all retries");
        None
    }
}
