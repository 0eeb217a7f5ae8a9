use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token issued for a scope.
///
/// # Example
/// ```
/// use agentrun::auth::AccessToken;
///
/// let token = AccessToken::new("secret");
/// assert!(!token.is_expired());
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::zero())
    }

    /// Whether the token expires before `now + skew`. Tokens without expiry never do.
    pub fn expires_within(&self, skew: Duration) -> bool {
        self.expires_at
            .map(|exp| exp <= Utc::now() + skew)
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"..")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
