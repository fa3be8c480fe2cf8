//! Bounded retry for writes that race with other clients.
//!
//! SQLite reports lock contention as an ordinary error. Writes to busy
//! secondary tables go through [`RetryPolicy::execute`], which backs off
//! exponentially with a little jitter and gives up after a fixed number of
//! attempts. Any other error is returned at once.

use std::{future::Future, time::Duration};

use rand::Rng;
use sea_orm::DbErr;

use crate::{EngineError, ResultEngine};

const CONTENTION_MARKERS: [&str; 4] = [
    "database is locked",
    "database table is locked",
    "sqlite_busy",
    "sqlite_locked",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound of the random delay added to each backoff.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_jitter: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt + 1`, without jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }

    /// Run `op` until it succeeds, fails with a non-contention error, or the
    /// attempt budget runs out.
    ///
    /// The future only sleeps between attempts, so dropping it (for example
    /// through `tokio::time::timeout`) cancels the remaining retries.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut op: F) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) if is_contention(&err) => err,
                Err(err) => return Err(err.into()),
            };

            attempt += 1;
            if attempt >= attempts {
                tracing::warn!(label, attempts, "storage still busy, giving up: {err}");
                return Err(EngineError::RetryExhausted {
                    attempts,
                    source: err,
                });
            }

            let delay = self.delay_for(attempt - 1) + self.jitter();
            tracing::warn!(
                label,
                attempt,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "storage busy, retrying: {err}"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// `true` when `err` reports a locked or busy database.
pub fn is_contention(err: &DbErr) -> bool {
    let message = err.to_string().to_ascii_lowercase();
    CONTENTION_MARKERS.iter().any(|m| message.contains(m))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        }
    }

    fn locked() -> DbErr {
        DbErr::Custom("database is locked".to_string())
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn contention_is_detected_from_message() {
        assert!(is_contention(&locked()));
        assert!(is_contention(&DbErr::Custom(
            "error returned from database: (code: 5) SQLITE_BUSY".to_string()
        )));
        assert!(!is_contention(&DbErr::Custom(
            "UNIQUE constraint failed".to_string()
        )));
    }

    #[tokio::test]
    async fn success_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = fast()
            .execute("test", || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(locked())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: ResultEngine<()> = fast()
            .execute("test", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(locked())
                }
            })
            .await;
        assert_eq!(
            result,
            Err(EngineError::RetryExhausted {
                attempts: 3,
                source: locked()
            })
        );
        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: ResultEngine<()> = fast()
            .execute("test", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DbErr::Custom("FOREIGN KEY constraint failed".to_string()))
                }
            })
            .await;
        assert_eq!(
            result,
            Err(EngineError::Database(DbErr::Custom(
                "FOREIGN KEY constraint failed".to_string()
            )))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn caller_timeout_cancels_backoff() {
        let slow = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(30),
            max_jitter: Duration::ZERO,
        };
        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            slow.execute("test", || async { Err::<(), _>(locked()) }),
        )
        .await;
        assert!(outcome.is_err());
    }
}
