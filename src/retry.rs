//! Retry policy for transient search failures.
//!
//! Implements exponential backoff with configurable parameters and a small
//! random jitter on top of the computed delay.

use rand::Rng;
use std::time::Duration;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts per request (first try included).
    pub max_attempts: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds (cap for exponential growth).
    pub max_backoff_ms: u64,
    /// Multiplier applied to backoff after each retry.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Backoff in milliseconds before retry number `retry_count` (0-based),
    /// without jitter.
    ///
    /// Uses `initial_backoff * multiplier^retry_count`, capped at
    /// `max_backoff_ms`.
    pub fn backoff_ms(&self, retry_count: u32) -> u64 {
        let backoff =
            self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(retry_count as i32);
        backoff.min(self.max_backoff_ms as f64) as u64
    }

    /// Backoff duration with up to one second of random jitter added,
    /// to avoid synchronized retry bursts across workers.
    pub fn delay(&self, retry_count: u32) -> Duration {
        let jitter_ms = rand::rng().random_range(0..1000);
        Duration::from_millis(self.backoff_ms(retry_count) + jitter_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
        }
    }
}
