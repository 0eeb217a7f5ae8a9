//! Single-prompt conversation against a configured agent.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentrun::auth::{CachedCredential, ChainedCredential};
//! use agentrun::config::AgentConfig;
//! use agentrun::conversation::Conversation;
//!
//! # async fn example() -> agentrun::error::Result<()> {
//! let config = AgentConfig::load(None)?.validate()?;
//! let credential = Arc::new(CachedCredential::new(Arc::new(ChainedCredential::default_chain())));
//! let conversation = Conversation::from_config(&config, credential)?;
//! for line in conversation.run_conversation("Hello, Agent!").await? {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::approval::ApprovalPolicy;
use crate::auth::{CredentialProvider, DEFAULT_SCOPE};
use crate::client::{AgentsClient, HttpAgentsClient};
use crate::config::ProjectConfig;
use crate::error::{AgentRunError, Result};
use crate::orchestrator::{RunEventSink, RunOrchestrator, RunOutcome, RunRequest};
use crate::transcript::{render, RenderedLine};
use crate::types::{Agent, ToolResources};

/// Looks up the agent, runs one prompt through it, and renders the transcript.
pub struct Conversation {
    client: Arc<dyn AgentsClient>,
    credential: Arc<dyn CredentialProvider>,
    orchestrator: RunOrchestrator,
    agent_id: String,
    scope: String,
    tool_resources: Option<ToolResources>,
    cancel: CancellationToken,
}

impl Conversation {
    pub fn new(
        config: &ProjectConfig,
        client: Arc<dyn AgentsClient>,
        credential: Arc<dyn CredentialProvider>,
    ) -> Self {
        let orchestrator = RunOrchestrator::new(client.clone())
            .with_poll_settings(config.poll.clone())
            .with_retry_policy(config.retry.clone());
        Self {
            client,
            credential,
            orchestrator,
            agent_id: config.agent_id.clone(),
            scope: DEFAULT_SCOPE.to_string(),
            tool_resources: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Conversation over HTTP to the configured endpoint.
    pub fn from_config(
        config: &ProjectConfig,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let client = HttpAgentsClient::from_config(config, credential.clone())?;
        Ok(Self::new(config, Arc::new(client), credential))
    }

    pub fn with_policy(mut self, policy: Arc<dyn ApprovalPolicy>) -> Self {
        self.orchestrator = self.orchestrator.with_policy(policy);
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.orchestrator = self.orchestrator.with_event_sink(sink);
        self
    }

    pub fn with_tool_resources(mut self, resources: ToolResources) -> Self {
        self.tool_resources = Some(resources);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `prompt` and return the rendered transcript of the whole thread.
    pub async fn run_conversation(&self, prompt: &str) -> Result<Vec<RenderedLine>> {
        let outcome = self.run(prompt).await?;
        Ok(render(&outcome.messages))
    }

    /// Run `prompt` and return the raw outcome.
    ///
    /// A missing agent is reported as [`AgentRunError::AgentNotFound`] before
    /// any thread or run is created.
    pub async fn run(&self, prompt: &str) -> Result<RunOutcome> {
        let agent = self.resolve_agent().await?;
        self.run_with_agent(&agent, prompt).await
    }

    /// Look up the configured agent.
    pub async fn resolve_agent(&self) -> Result<Agent> {
        match self.client.get_agent(&self.agent_id).await {
            Ok(agent) => {
                tracing::debug!(agent_id = %agent.id, name = ?agent.name, "resolved agent");
                Ok(agent)
            }
            Err(AgentRunError::NotFound(message)) => Err(AgentRunError::AgentNotFound(message)),
            Err(err) => Err(err),
        }
    }

    /// Run `prompt` against an agent already returned by [`Self::resolve_agent`].
    pub async fn run_with_agent(&self, agent: &Agent, prompt: &str) -> Result<RunOutcome> {
        let token = self.credential.get_token(&self.scope).await?;
        let request = RunRequest::builder()
            .agent_id(agent.id.clone())
            .prompt(prompt)
            .bearer_token(token.token)
            .maybe_tool_resources(self.tool_resources.clone())
            .build();

        self.orchestrator.execute(&request, &self.cancel).await
    }
}
