//! Configuration system (layered: CLI > env > config file > defaults).
//!
//! Only the project endpoint and agent id are required; both are opaque
//! strings checked for non-emptiness and nothing else.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AgentRunError, Result};
use crate::orchestrator::PollSettings;
use crate::util::retry::RetryPolicy;

pub const ENDPOINT_ENV: &str = "AI_PROJECT_ENDPOINT";
pub const AGENT_ID_ENV: &str = "AI_AGENT_ID";
pub const API_VERSION_ENV: &str = "AI_API_VERSION";
pub const POLL_INTERVAL_ENV: &str = "AGENTRUN_POLL_INTERVAL_MS";
pub const RUN_TIMEOUT_ENV: &str = "AGENTRUN_RUN_TIMEOUT_SECS";
pub const MAX_POLLS_ENV: &str = "AGENTRUN_MAX_POLLS";
pub const MAX_RETRIES_ENV: &str = "AGENTRUN_MAX_RETRIES";

pub const DEFAULT_API_VERSION: &str = "v1";

/// Unvalidated, partially populated configuration from one or more sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub endpoint: Option<String>,
    pub agent_id: Option<String>,
    pub api_version: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub run_timeout_secs: Option<u64>,
    pub max_polls: Option<u32>,
    pub max_retries: Option<u32>,
}

/// Validated configuration ready to build a client and orchestrator from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub endpoint: String,
    pub agent_id: String,
    pub api_version: String,
    pub poll: PollSettings,
    pub retry: RetryPolicy,
}

impl AgentConfig {
    /// Load the file layer (if present) overlaid with the environment.
    ///
    /// `path` overrides the default `~/.agentrun/config.toml`; an explicit path
    /// that does not exist is an error, a missing default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let file = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = default_config_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(file.merge(Self::from_env()?))
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgentRunError::Configuration(format!(
                "Could not read config file {}: {e}",
                path.display()
            ))
        })?;
        toml::from_str(&raw).map_err(|e| {
            AgentRunError::Configuration(format!(
                "Invalid config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            endpoint: text(ENDPOINT_ENV),
            agent_id: text(AGENT_ID_ENV),
            api_version: text(API_VERSION_ENV),
            poll_interval_ms: parse_number(POLL_INTERVAL_ENV, text(POLL_INTERVAL_ENV))?,
            run_timeout_secs: parse_number(RUN_TIMEOUT_ENV, text(RUN_TIMEOUT_ENV))?,
            max_polls: parse_number(MAX_POLLS_ENV, text(MAX_POLLS_ENV))?,
            max_retries: parse_number(MAX_RETRIES_ENV, text(MAX_RETRIES_ENV))?,
        })
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            endpoint: other.endpoint.or(self.endpoint),
            agent_id: other.agent_id.or(self.agent_id),
            api_version: other.api_version.or(self.api_version),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            run_timeout_secs: other.run_timeout_secs.or(self.run_timeout_secs),
            max_polls: other.max_polls.or(self.max_polls),
            max_retries: other.max_retries.or(self.max_retries),
        }
    }

    /// Check required values and apply defaults.
    pub fn validate(&self) -> Result<ProjectConfig> {
        let endpoint = required(&self.endpoint, ENDPOINT_ENV)?;
        let agent_id = required(&self.agent_id, AGENT_ID_ENV)?;

        let defaults = PollSettings::default();
        let poll_interval = self
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.interval);
        if poll_interval.is_zero() {
            return Err(AgentRunError::Configuration(format!(
                "{POLL_INTERVAL_ENV} must be greater than zero"
            )));
        }

        let mut retry = RetryPolicy::default();
        if let Some(max_retries) = self.max_retries {
            retry.max_attempts = max_retries.saturating_add(1);
        }

        Ok(ProjectConfig {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            agent_id,
            api_version: self
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            poll: PollSettings {
                interval: poll_interval,
                run_timeout: self
                    .run_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.run_timeout),
                max_polls: self.max_polls.or(defaults.max_polls),
            },
            retry,
        })
    }
}

/// `~/.agentrun/config.toml`, falling back to a relative path without a home dir.
pub fn default_config_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".agentrun"))
        .unwrap_or_else(|| PathBuf::from(".agentrun"))
        .join("config.toml")
}

fn required(value: &Option<String>, env_var: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AgentRunError::Configuration(format!(
            "Please set the {env_var} environment variable."
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>> {
    raw.map(|value| {
        value.trim().parse::<T>().map_err(|_| {
            AgentRunError::Configuration(format!("{key} must be a non-negative integer, got '{value}'"))
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_endpoint_reports_env_var() {
        let config = AgentConfig::from_lookup(lookup(&[(AGENT_ID_ENV, "asst_1")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.is_clean_exit());
        assert_eq!(
            err.to_string(),
            "Please set the AI_PROJECT_ENDPOINT environment variable."
        );
    }

    #[test]
    fn blank_agent_id_counts_as_missing() {
        let config = AgentConfig::from_lookup(lookup(&[
            (ENDPOINT_ENV, "https://example.test/api/projects/p"),
            (AGENT_ID_ENV, "   "),
        ]))
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please set the AI_AGENT_ID environment variable."
        );
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = AgentConfig::from_lookup(lookup(&[
            (ENDPOINT_ENV, "https://example.test/api/projects/p/"),
            (AGENT_ID_ENV, "asst_1"),
        ]))
        .unwrap()
        .validate()
        .unwrap();

        assert_eq!(config.endpoint, "https://example.test/api/projects/p");
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.poll, PollSettings::default());
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let config = AgentConfig::from_lookup(lookup(&[
            (ENDPOINT_ENV, "https://example.test"),
            (AGENT_ID_ENV, "asst_1"),
            (POLL_INTERVAL_ENV, "250"),
            (RUN_TIMEOUT_ENV, "60"),
            (MAX_POLLS_ENV, "40"),
            (MAX_RETRIES_ENV, "0"),
        ]))
        .unwrap()
        .validate()
        .unwrap();

        assert_eq!(config.poll.interval, Duration::from_millis(250));
        assert_eq!(config.poll.run_timeout, Duration::from_secs(60));
        assert_eq!(config.poll.max_polls, Some(40));
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn malformed_number_is_a_configuration_error() {
        let err = AgentConfig::from_lookup(lookup(&[(POLL_INTERVAL_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, AgentRunError::Configuration(msg) if msg.contains(POLL_INTERVAL_ENV)));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = AgentConfig {
            endpoint: Some("https://example.test".into()),
            agent_id: Some("asst_1".into()),
            poll_interval_ms: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_layer_overrides_file_layer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "endpoint = \"https://file.test\"\nagent_id = \"asst_file\"\npoll_interval_ms = 900\n",
        )
        .unwrap();

        let file = AgentConfig::from_file(&path).unwrap();
        let env = AgentConfig::from_lookup(lookup(&[(AGENT_ID_ENV, "asst_env")])).unwrap();
        let merged = file.merge(env);

        assert_eq!(merged.endpoint.as_deref(), Some("https://file.test"));
        assert_eq!(merged.agent_id.as_deref(), Some("asst_env"));
        assert_eq!(merged.poll_interval_ms, Some(900));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "endpont = \"typo\"\n").unwrap();

        let err = AgentConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, AgentRunError::Configuration(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = AgentConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, AgentRunError::Configuration(msg) if msg.contains("absent.toml")));
    }
}
