//! Bounded retry with exponential backoff.
//!
//! Applied by composition around the ingestion fetch only; storage calls are
//! not retried.

use std::thread;
use std::time::Duration;

use log::{error, warn};

use crate::domain::error::SentryError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or attempts are exhausted, sleeping
    /// between failures. The last error is returned when every attempt
    /// fails.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T, SentryError>
    where
        F: FnMut() -> Result<T, SentryError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut delay = self.base_delay;

        for attempt in 1..=attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!(
                        "{label} failed (attempt {attempt}/{attempts}), retrying in {:.1}s: {e}",
                        delay.as_secs_f64()
                    );
                    thread::sleep(delay);
                    delay = delay.mul_f64(self.multiplier);
                }
                Err(e) => {
                    error!("{label} failed after {attempts} attempts: {e}");
                    return Err(e);
                }
            }
        }
        unreachable!("retry loop always returns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }

    #[test]
    fn succeeds_first_try_without_retrying() {
        let calls = Cell::new(0);
        let result = quick().run("op", || {
            calls.set(calls.get() + 1);
            Ok::<_, SentryError>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_until_success() {
        let calls = Cell::new(0);
        let result = quick().run("op", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(SentryError::Fetch {
                    source_name: "test".into(),
                    reason: "flaky".into(),
                })
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhausts_attempts_and_returns_last_error() {
        let calls = Cell::new(0);
        let result: Result<(), _> = quick().run("op", || {
            calls.set(calls.get() + 1);
            Err(SentryError::Fetch {
                source_name: "test".into(),
                reason: "down".into(),
            })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn zero_attempts_is_treated_as_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..quick()
        };
        let calls = Cell::new(0);
        let _ = policy.run("op", || {
            calls.set(calls.get() + 1);
            Ok::<_, SentryError>(())
        });
        assert_eq!(calls.get(), 1);
    }
}
