//! Remote agents service boundary.
//!
//! [`AgentsClient`] is the only way the orchestrator talks to the service, so
//! tests substitute a scripted implementation and production uses
//! [`HttpAgentsClient`].

pub mod http;

pub use http::{status_to_error, HttpAgentsClient};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Agent, ListOrder, Message, MessageRole, Run, Thread, ToolApprovalDecision, ToolResources,
};

/// Request/response operations of the persistent agents service.
#[async_trait]
pub trait AgentsClient: Send + Sync {
    /// Look up an agent; a missing agent is [`crate::error::AgentRunError::NotFound`].
    async fn get_agent(&self, agent_id: &str) -> Result<Agent>;

    async fn create_thread(&self) -> Result<Thread>;

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Message>;

    async fn create_run(
        &self,
        thread_id: &str,
        agent_id: &str,
        tool_resources: Option<&ToolResources>,
    ) -> Result<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        decisions: &[ToolApprovalDecision],
    ) -> Result<Run>;

    /// Every message of the thread, in the requested order.
    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<Message>>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;
}
