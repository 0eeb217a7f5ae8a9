//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::AgentRunError;

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Execute an async operation, retrying errors for which
    /// [`AgentRunError::is_retryable`] holds.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, AgentRunError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentRunError>>,
    {
        let mut backoff = self.initial_backoff;
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_retryable() || attempt + 1 >= self.max_attempts {
                        return Err(e);
                    }

                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Retrying after error"
                    );

                    let sleep_duration = match &e {
                        AgentRunError::RateLimited {
                            retry_after_ms: Some(ms),
                        } => Duration::from_millis(*ms).min(self.max_backoff),
                        _ => {
                            // Jitter: 75%–125% of backoff
                            let jitter_factor = 0.75 + (rand_factor() * 0.5);
                            Duration::from_secs_f64(backoff.as_secs_f64() * jitter_factor)
                        }
                    };
                    tokio::time::sleep(sleep_duration).await;

                    backoff = Duration::from_secs_f64(
                        (backoff.as_secs_f64() * self.multiplier)
                            .min(self.max_backoff.as_secs_f64()),
                    );

                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(AgentRunError::Timeout(0)))
    }
}

/// Jitter factor in [0, 1), seeded from the clock and the current thread id.
fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    let hash = hasher.finish();
    (hash % 10000) as f64 / 10000.0
}
