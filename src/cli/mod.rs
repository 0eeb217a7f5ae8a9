//! Command-line surface for the `agentrun` binary.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AgentConfig;

/// Prompt used when the user enters nothing.
pub const DEFAULT_PROMPT: &str = "Hello, Agent!";

/// Run a prompt through a hosted agent and print the conversation.
#[derive(Parser, Debug)]
#[command(name = "agentrun", version, about = "Run a prompt through a hosted agent")]
pub struct Cli {
    /// Prompt to send; read from stdin when omitted
    pub prompt: Option<String>,

    /// Project endpoint (overrides AI_PROJECT_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Agent identifier (overrides AI_AGENT_ID)
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Service API version
    #[arg(long)]
    pub api_version: Option<String>,

    /// Milliseconds between run status polls
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Seconds to wait for the run before giving up
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Maximum number of status polls
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Approve only these tools (repeatable); all tools are approved when absent
    #[arg(long = "allow-tool", value_name = "NAME")]
    pub allow_tools: Vec<String>,

    /// Config file (defaults to ~/.agentrun/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Configuration layer made of the flags that were given.
    pub fn overrides(&self) -> AgentConfig {
        AgentConfig {
            endpoint: self.endpoint.clone(),
            agent_id: self.agent_id.clone(),
            api_version: self.api_version.clone(),
            poll_interval_ms: self.poll_interval_ms,
            run_timeout_secs: self.timeout_secs,
            max_polls: self.max_polls,
            max_retries: None,
        }
    }
}

/// Pick the prompt to send: the given one, else `DEFAULT_PROMPT` for blank input.
pub fn resolve_prompt(input: Option<&str>) -> String {
    match input.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => DEFAULT_PROMPT.to_string(),
    }
}

/// Initialize stderr logging from `RUST_LOG`, defaulting to `warn`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
