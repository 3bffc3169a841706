//! Bounded retry for transient failures.

use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::{PosError, Result};

/// Fixed-delay retry budget. The default mirrors the terminal's menu
/// loader: three attempts, half a second apart.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Clamped to at least 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying while it fails with a transient error and
    /// attempts remain. Non-transient errors return immediately; the
    /// last transient error is returned once the budget is spent.
    pub fn run<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_err: Option<PosError> = None;

        for attempt in 1..=attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(attempt, max = attempts, error = %e, "transient failure, retrying");
                    last_err = Some(e);
                    thread::sleep(self.delay);
                }
                Err(e) => return Err(e),
            }
        }

        // Unreachable: the loop always returns on its final attempt.
        Err(last_err.unwrap_or_else(|| PosError::Network("retry budget exhausted".into())))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn first_success_needs_no_retry() {
        let calls = Cell::new(0);
        let out = fast(3).run(|| {
            calls.set(calls.get() + 1);
            Ok(7)
        });
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn transient_errors_are_retried_up_to_the_budget() {
        let calls = Cell::new(0);
        let out: Result<()> = fast(3).run(|| {
            calls.set(calls.get() + 1);
            Err(PosError::Network("down".into()))
        });
        assert!(matches!(out, Err(PosError::Network(_))));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn non_transient_errors_fail_immediately() {
        let calls = Cell::new(0);
        let out: Result<()> = fast(3).run(|| {
            calls.set(calls.get() + 1);
            Err(PosError::Validation("bad input".into()))
        });
        assert!(matches!(out, Err(PosError::Validation(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recovery_mid_budget_returns_the_value() {
        let calls = Cell::new(0);
        let out = fast(3).run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(PosError::Network("down".into()))
            } else {
                Ok("up")
            }
        });
        assert_eq!(out.unwrap(), "up");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let _ = fast(0).run(|| {
            calls.set(calls.get() + 1);
            Ok(())
        });
        assert_eq!(calls.get(), 1);
    }
}
