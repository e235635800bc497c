use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::OmicsError;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_PAUSE_SECS: u64 = 30;

/// Fixed-pause retry: up to `max_retries` further attempts after the first,
/// sleeping `pause` between them. No backoff growth, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            pause: Duration::from_secs(DEFAULT_PAUSE_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Runs `attempt` until it succeeds or the budget is spent.
    ///
    /// Only [`OmicsError::is_retryable`] failures are retried; other errors
    /// are returned unchanged on first sight. Exhaustion yields
    /// [`OmicsError::Fetch`] carrying the last failure.
    pub fn run<T, F>(&self, label: &str, mut attempt: F) -> Result<T, OmicsError>
    where
        F: FnMut() -> Result<T, OmicsError>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt() {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    if attempts >= self.total_attempts() {
                        return Err(OmicsError::Fetch {
                            attempts,
                            source: Box::new(err),
                        });
                    }
                    warn!(
                        attempt = attempts,
                        max_attempts = self.total_attempts(),
                        error = %err,
                        "{label} failed; will try again in {} seconds",
                        self.pause.as_secs_f64()
                    );
                    if !self.pause.is_zero() {
                        thread::sleep(self.pause);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use assert_matches::assert_matches;

    use super::*;

    fn instant(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            pause: Duration::ZERO,
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result = instant(5).run("getProfileData", || {
            calls.set(calls.get() + 1);
            if calls.get() <= 3 {
                Err(OmicsError::CgdsHttp("connection reset".to_string()))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn exhausts_after_total_attempts() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = instant(5).run("getProfileData", || {
            calls.set(calls.get() + 1);
            Err(OmicsError::CgdsStatus {
                status: 502,
                message: "bad gateway".to_string(),
            })
        });
        assert_eq!(calls.get(), 6);
        let err = result.unwrap_err();
        assert_matches!(err, OmicsError::Fetch { attempts: 6, ref source }
            if matches!(**source, OmicsError::CgdsStatus { status: 502, .. }));
    }

    #[test]
    fn non_retryable_error_is_not_retried() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = instant(5).run("getProfileData", || {
            calls.set(calls.get() + 1);
            Err(OmicsError::Validation("bad id".to_string()))
        });
        assert_eq!(calls.get(), 1);
        assert_matches!(result, Err(OmicsError::Validation(_)));
    }

    #[test]
    fn huge_retry_budget_saturates() {
        let policy = instant(u32::MAX);
        assert_eq!(policy.total_attempts(), u32::MAX);

        let calls = Cell::new(0u32);
        let result = policy.run("getProfileData", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(OmicsError::CgdsHttp("connection reset".to_string()))
            } else {
                Ok("rows")
            }
        });
        assert_eq!(result.unwrap(), "rows");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn default_policy_matches_service_etiquette() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_attempts(), 6);
        assert_eq!(policy.pause, Duration::from_secs(30));
    }
}
