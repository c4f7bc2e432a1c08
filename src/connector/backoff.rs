//! Bounded exponential backoff, independent of any transport
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Retry policy for opening store sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Growth factor applied to the delay after each further failure
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_multiplier() -> u32 {
    2
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl RetryPolicy {
    /// Policy that retries without sleeping (tests, local tooling)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            multiplier: 1,
            max_delay_ms: 0,
        }
    }
}

/// Attempt counter plus delay computation.
///
/// Call [`Backoff::next_delay`] after every failed attempt: it returns the
/// pause before the next attempt, or `None` once the policy is exhausted.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    failures: u32,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            failures: 0,
        }
    }

    /// Number of failed attempts recorded so far
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn next_delay(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.policy.max_attempts {
            return None;
        }

        let factor = u64::from(self.policy.multiplier).saturating_pow(self.failures - 1);
        let delay_ms = self
            .policy
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.policy.max_delay_ms);
        Some(Duration::from_millis(delay_ms))
    }
}

/// Final failure of a retried operation
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub error: E,
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number. Only the last error is kept.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut backoff = Backoff::new(*policy);

    loop {
        let attempt = backoff.failures() + 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => match backoff.next_delay() {
                Some(delay) => {
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(attempt, error = %err, "Attempt failed, giving up");
                    return Err(RetryExhausted {
                        attempts: attempt,
                        error: err,
                    });
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.multiplier, 2);
    }

    #[test]
    fn test_backoff_doubles_then_stops() {
        let mut backoff = Backoff::new(RetryPolicy::default());

        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(2)));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.failures(), 3);
    }

    #[test]
    fn test_backoff_respects_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay_ms: 1000,
            multiplier: 10,
            max_delay_ms: 5000,
        };
        let delays: Vec<_> = std::iter::from_fn({
            let mut backoff = Backoff::new(policy);
            move || backoff.next_delay()
        })
        .collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(5000),
                Duration::from_millis(5000),
                Duration::from_millis(5000),
                Duration::from_millis(5000),
            ]
        );
    }

    #[test]
    fn test_single_attempt_never_waits() {
        let mut backoff = Backoff::new(RetryPolicy::immediate(1));
        assert_eq!(backoff.next_delay(), None);
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_third_attempt() {
        let mut seen = Vec::new();

        let result = retry(&RetryPolicy::immediate(3), |attempt| {
            seen.push(attempt);
            async move {
                if attempt < 3 {
                    Err(format!("transient failure {attempt}"))
                } else {
                    Ok("session")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "session");
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_retry_surfaces_last_error() {
        let mut calls = 0;

        let result: Result<(), _> = retry(&RetryPolicy::immediate(3), |attempt| {
            calls += 1;
            async move { Err(format!("refused on attempt {attempt}")) }
        })
        .await;

        let exhausted = result.unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.error, "refused on attempt 3");
    }
}
