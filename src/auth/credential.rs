//! [`CredentialProvider`] implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{AgentRunError, Result};

use super::token::AccessToken;

/// Token scope for the AI projects data plane.
pub const DEFAULT_SCOPE: &str = "https://ai.azure.com/.default";

/// Environment variable read by [`EnvCredential`].
pub const TOKEN_ENV_VAR: &str = "AI_PROJECT_TOKEN";

/// Tokens are refreshed this long before they expire.
const REFRESH_SKEW_SECS: i64 = 300;

/// Supplies bearer tokens on demand.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// A fixed token, mostly useful for tests and pre-issued tokens.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: AccessToken,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Reads a pre-issued token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self {
            var: TOKEN_ENV_VAR.to_string(),
        }
    }
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(AccessToken::new(token.trim())),
            _ => Err(AgentRunError::Authentication(format!(
                "{} is not set",
                self.var
            ))),
        }
    }
}

/// Obtains tokens from a logged-in Azure CLI session.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    program: String,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };
        Self {
            program: program.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_output(stdout: &[u8]) -> Result<AccessToken> {
        let response: CliTokenResponse = serde_json::from_slice(stdout)?;
        let mut token = AccessToken::new(response.access_token);
        if let Some(expires_at) = response
            .expires_on
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        {
            token = token.with_expiry(expires_at);
        }
        Ok(token)
    }
}

#[async_trait]
impl CredentialProvider for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        tracing::debug!(scope, "requesting token from Azure CLI");
        let output = tokio::process::Command::new(&self.program)
            .args(["account", "get-access-token", "--scope", scope, "--output", "json"])
            .output()
            .await
            .map_err(|e| {
                AgentRunError::Authentication(format!("Azure CLI is not available: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentRunError::Authentication(format!(
                "Azure CLI could not issue a token: {}",
                stderr.trim()
            )));
        }

        Self::parse_output(&output.stdout)
    }
}

/// Tries each provider in order; the first token wins.
pub struct ChainedCredential {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainedCredential {
    pub fn new(providers: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment token first, then the Azure CLI.
    pub fn default_chain() -> Self {
        Self::new(vec![
            Arc::new(EnvCredential::default()),
            Arc::new(AzureCliCredential::default()),
        ])
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.get_token(scope).await {
                Ok(token) => return Ok(token),
                Err(err) => {
                    tracing::debug!(error = %err, "credential source unavailable");
                    failures.push(err.to_string());
                }
            }
        }
        Err(AgentRunError::Authentication(format!(
            "no credential source produced a token ({})",
            failures.join("; ")
        )))
    }
}

/// Reuses tokens per scope until they are close to expiry.
pub struct CachedCredential {
    inner: Arc<dyn CredentialProvider>,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl CachedCredential {
    pub fn new(inner: Arc<dyn CredentialProvider>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CredentialProvider for CachedCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(scope) {
            if !token.expires_within(Duration::seconds(REFRESH_SKEW_SECS)) {
                return Ok(token.clone());
            }
        }
        let token = self.inner.get_token(scope).await?;
        cache.insert(scope.to_string(), token.clone());
        Ok(token)
    }
}
