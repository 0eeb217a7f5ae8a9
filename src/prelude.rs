//! Convenience re-exports for common use.

pub use crate::approval::{ApprovalContext, ApprovalPolicy, AutoApprove, ToolAllowList};
pub use crate::auth::{AccessToken, CachedCredential, ChainedCredential, CredentialProvider};
pub use crate::client::{AgentsClient, HttpAgentsClient};
pub use crate::config::{AgentConfig, ProjectConfig};
pub use crate::conversation::Conversation;
pub use crate::error::{AgentRunError, Result};
pub use crate::orchestrator::{PollSettings, RunEvent, RunOrchestrator, RunOutcome, RunRequest};
pub use crate::transcript::{render, RenderedLine};
pub use crate::types::{
    ContentItem, Message, MessageRole, Run, RunStatus, ToolApprovalDecision, ToolCallRequest,
};
