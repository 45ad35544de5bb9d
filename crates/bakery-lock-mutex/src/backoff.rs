//! Randomized retry delay for the ordered-wait polls.

use std::time::Duration;

use bakery_lock_core::error::{LockError, LockResult};
use rand::Rng;

/// Uniform random sleep window used between polls of another participant's
/// state.
///
/// Every participant polls the same keys, so a fixed delay would line their
/// requests up against the backend; drawing each delay uniformly from
/// `[min, max]` spreads them out. The bounds tune throughput and request
/// pressure only, never correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    min: Duration,
    max: Duration,
}

impl Backoff {
    /// Lower bound of the default window.
    pub const DEFAULT_MIN: Duration = Duration::from_secs(5);
    /// Upper bound of the default window.
    pub const DEFAULT_MAX: Duration = Duration::from_secs(15);

    /// Creates a window. Fails if `min > max`.
    pub fn new(min: Duration, max: Duration) -> LockResult<Self> {
        if min > max {
            return Err(LockError::InvalidConfig(format!(
                "backoff minimum {min:?} exceeds maximum {max:?}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Window in milliseconds, convenient for environment configuration.
    pub fn from_millis(min: u64, max: u64) -> LockResult<Self> {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    /// Polls again immediately (after yielding to the scheduler).
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws the next delay, millisecond granularity.
    pub fn next_delay(&self) -> Duration {
        let min = millis(self.min);
        let max = millis(self.max);
        if min >= max {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Sleeps for a freshly drawn delay.
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}
