//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::AgentRunError;

/// Wrap a fallible future with a deadline, mapping expiry to [`AgentRunError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, AgentRunError>>,
) -> Result<T, AgentRunError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(AgentRunError::Timeout(duration.as_millis() as u64)),
    }
}
