//! Retry timing for transient failures.
//!
//! This module only answers "may I try again, and after how long?". Deciding
//! *whether* an error is transient belongs to the error taxonomy
//! (`ExecError::is_transient`). Authentication failures never reach this
//! code at all; they are handled by the one-shot re-authentication path in
//! the request executor.

use std::time::Duration;

use rand::Rng;

/// Backoff strategy for calculating retry delays.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff: `initial_delay * base^retry`, capped at
    /// `max_delay`.
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Delay before the given retry (0-based).
    #[must_use]
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let delay = initial_delay.as_millis() as f64 * base.powi(retry as i32);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}

/// Jitter applied to computed delays so concurrent retriers spread out
/// instead of stampeding the server in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    None,
    /// Uniform in `0..=delay`.
    Full,
    /// Uniform in `delay/2..=delay`.
    Equal,
}

impl Jitter {
    /// Apply jitter to a calculated delay.
    #[must_use]
    pub fn apply(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        if delay_ms == 0 {
            return Duration::ZERO;
        }
        match self {
            Self::None => delay,
            Self::Full => Duration::from_millis(rand::thread_rng().gen_range(0..=delay_ms)),
            Self::Equal => {
                let half = delay_ms / 2;
                Duration::from_millis(half + rand::thread_rng().gen_range(0..=delay_ms - half))
            }
        }
    }
}

/// Bounded retry schedule for transient errors.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    max_retries: u32,
    backoff: BackoffStrategy,
    jitter: Jitter,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(200),
                base: 2.0,
                max_delay: Duration::from_secs(10),
            },
            jitter: Jitter::Equal,
        }
    }
}

impl RetryStrategy {
    #[must_use]
    pub fn new(max_retries: u32, backoff: BackoffStrategy, jitter: Jitter) -> Self {
        Self { max_retries, backoff, jitter }
    }

    /// A strategy that never retries; useful in tests and for callers that
    /// need fail-fast semantics.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, BackoffStrategy::Fixed(Duration::ZERO), Jitter::None)
    }

    /// Whether another retry is allowed after `retries_so_far` retries.
    #[must_use]
    pub fn allows_retry(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }

    /// Jittered delay before the given retry (0-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        self.jitter.apply(self.backoff.calculate_delay(retry))
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
