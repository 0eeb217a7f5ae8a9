//! Data model shared by the client, orchestrator, and renderer.

pub mod message;
pub mod run;
pub mod thread;

pub use message::{ContentItem, ListOrder, Message, MessageRole};
pub use run::{
    RequiredAction, Run, RunError, RunStatus, ToolApprovalDecision, ToolCallRequest,
    ToolResources, McpToolResource,
};
pub use thread::{Agent, Thread};

/// Opaque thread identifier.
pub type ThreadId = String;
/// Opaque run identifier.
pub type RunId = String;
/// Opaque agent identifier.
pub type AgentId = String;
