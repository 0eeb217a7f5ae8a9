//! Error types for agentrun.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::types::RunStatus;

/// Primary error type for all agentrun operations.
#[derive(Error, Debug)]
pub enum AgentRunError {
    #[error("{0}")]
    Configuration(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Run {status}: {}", message.as_deref().unwrap_or("no error details reported"))]
    RunFailed {
        status: RunStatus,
        message: Option<String>,
    },

    #[error("Run cancelled locally")]
    Cancelled,

    #[error("Run did not finish within {0}ms")]
    Timeout(u64),

    #[error("Run did not finish within {0} polls")]
    PollLimitExceeded(u32),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl AgentRunError {
    /// Create an API error without a provider code.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) | Self::PollLimitExceeded(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::AgentNotFound(_) | Self::NotFound(_) => ErrorCategory::NotFound,
            Self::RunFailed { .. } => ErrorCategory::RunFailure,
            Self::Cancelled => ErrorCategory::Cancellation,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                404 => ErrorCategory::NotFound,
                408 => ErrorCategory::Timeout,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether a single remote call that failed this way may be retried.
    ///
    /// Whole-run timeouts are not retryable: they already exhausted the wait budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::PollLimitExceeded(_) => false,
            _ => matches!(
                self.category(),
                ErrorCategory::RateLimit
                    | ErrorCategory::Network
                    | ErrorCategory::Timeout
                    | ErrorCategory::Server
            ),
        }
    }

    /// Errors handled at the boundary: reported to the user, process exits cleanly.
    pub fn is_clean_exit(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::AgentNotFound(_))
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server => {
                RecoverySuggestion::RetryWithBackoff
            }
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration | ErrorCategory::NotFound => {
                RecoverySuggestion::CheckConfiguration
            }
            ErrorCategory::RunFailure => RecoverySuggestion::InspectRun,
            ErrorCategory::Cancellation => RecoverySuggestion::None,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentRunError>;
