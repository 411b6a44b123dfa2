//! Retry policy with configurable backoff and jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{ErrorKind, ScrapeError};

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * 2^attempt
    #[default]
    Exponential,
    /// delay = base * (attempt + 1)
    Linear,
    /// delay = base (constant)
    Constant,
}

/// Jitter strategy applied on top of the backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to delay
    #[default]
    Full,
    /// Half fixed, half random
    Equal,
}

/// How a fetch client retries a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Base delay between attempts in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on a single delay in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Backoff strategy.
    #[serde(default)]
    pub backoff: BackoffStrategy,
    /// Jitter strategy.
    #[serde(default)]
    pub jitter: JitterStrategy,
    /// HTTP statuses worth another attempt.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: Vec<u16>,
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_retry_status_codes() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff: BackoffStrategy::default(),
            jitter: JitterStrategy::default(),
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter = strategy;
        self
    }

    /// Whether `error` deserves another attempt, ignoring the attempt budget.
    #[must_use]
    pub fn is_retryable(&self, error: &ScrapeError) -> bool {
        match error.kind() {
            ErrorKind::Timeout | ErrorKind::Network => true,
            ErrorKind::Other => error
                .http_status()
                .is_some_and(|status| self.retry_status_codes.contains(&status)),
            ErrorKind::Processing => false,
        }
    }

    /// Whether another attempt should follow `attempt` (1-based) failing with `error`.
    #[must_use]
    pub fn should_retry(&self, attempt: usize, error: &ScrapeError) -> bool {
        attempt < self.max_attempts && self.is_retryable(error)
    }

    /// Delay before the retry that follows attempt `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let base = self.base_delay_ms;
        let max = self.max_delay_ms;

        let delay = match self.backoff {
            BackoffStrategy::Exponential => {
                let exponent = u32::try_from(attempt).unwrap_or(u32::MAX);
                base.saturating_mul(2u64.saturating_pow(exponent)).min(max)
            }
            BackoffStrategy::Linear => base.saturating_mul(attempt as u64 + 1).min(max),
            BackoffStrategy::Constant => base.min(max),
        };

        let jittered = match self.jitter {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
        };

        Duration::from_millis(jittered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_without_jitter() {
        let policy = RetryPolicy::new()
            .with_base_delay_ms(100)
            .with_max_delay_ms(10_000)
            .with_jitter(JitterStrategy::None);

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_linear_and_constant_backoff() {
        let linear = RetryPolicy::new()
            .with_base_delay_ms(100)
            .with_backoff(BackoffStrategy::Linear)
            .with_jitter(JitterStrategy::None);
        assert_eq!(linear.delay_for(2), Duration::from_millis(300));

        let constant = linear.with_backoff(BackoffStrategy::Constant);
        assert_eq!(constant.delay_for(5), Duration::from_millis(100));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new()
            .with_base_delay_ms(1000)
            .with_max_delay_ms(5000)
            .with_jitter(JitterStrategy::None);
        assert_eq!(policy.delay_for(10), Duration::from_millis(5000));
        assert_eq!(policy.delay_for(usize::MAX), Duration::from_millis(5000));
    }

    #[test]
    fn test_full_jitter_within_bounds() {
        let policy = RetryPolicy::new().with_base_delay_ms(100).with_jitter(JitterStrategy::Full);
        for _ in 0..50 {
            assert!(policy.delay_for(1) <= Duration::from_millis(200));
        }
    }

    #[test]
    fn test_equal_jitter_keeps_half() {
        let policy = RetryPolicy::new().with_base_delay_ms(100).with_jitter(JitterStrategy::Equal);
        for _ in 0..50 {
            let delay = policy.delay_for(0);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(100));
        }
    }

    #[test]
    fn test_retryable_classification() {
        let policy = RetryPolicy::new();
        assert!(policy.is_retryable(&ScrapeError::timeout("/a")));
        assert!(policy.is_retryable(&ScrapeError::network("/a", "reset")));
        assert!(policy.is_retryable(&ScrapeError::status("/a", 503)));
        assert!(!policy.is_retryable(&ScrapeError::status("/a", 404)));
        assert!(!policy.is_retryable(&ScrapeError::transport("/a", "closed")));
        assert!(!policy.is_retryable(&ScrapeError::processing("s", "bad")));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::new().with_max_attempts(3);
        let err = ScrapeError::timeout("/a");
        assert!(policy.should_retry(1, &err));
        assert!(policy.should_retry(2, &err));
        assert!(!policy.should_retry(3, &err));
        assert!(!RetryPolicy::no_retry().should_retry(1, &err));
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 5, "backoff": "linear"}"#).unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, BackoffStrategy::Linear);
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.retry_status_codes, vec![429, 500, 502, 503, 504]);
    }
}
