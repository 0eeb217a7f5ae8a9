//! Tool approval policies.
//!
//! The orchestrator hands every pending tool call of a needs-action round to an
//! [`ApprovalPolicy`] and submits whatever decisions come back. Policies are
//! synchronous and must not perform network calls.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{ToolApprovalDecision, ToolCallRequest};

/// Header carrying the caller's bearer token to the remote tool.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Default header carrying the conversation thread id to the remote tool.
pub const DEFAULT_THREAD_HEADER: &str = "x-thread-id";

/// Ambient authorization context for a decision round.
#[derive(Clone, PartialEq, Eq)]
pub struct ApprovalContext {
    pub bearer_token: String,
    pub thread_id: String,
}

impl ApprovalContext {
    pub fn new(bearer_token: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            thread_id: thread_id.into(),
        }
    }
}

impl std::fmt::Debug for ApprovalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalContext")
            .field("bearer_token", &"..")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

/// Decides, for each pending tool call, whether to approve it.
///
/// Implementations return exactly one decision per pending call.
pub trait ApprovalPolicy: Send + Sync {
    fn decide(
        &self,
        pending: &[ToolCallRequest],
        context: &ApprovalContext,
    ) -> Vec<ToolApprovalDecision>;
}

/// Approves every tool call, forwarding the bearer token and thread id as headers.
#[derive(Debug, Clone)]
pub struct AutoApprove {
    thread_header: String,
}

impl Default for AutoApprove {
    fn default() -> Self {
        Self {
            thread_header: DEFAULT_THREAD_HEADER.to_string(),
        }
    }
}

impl AutoApprove {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different header name for the thread id.
    pub fn with_thread_header(mut self, name: impl Into<String>) -> Self {
        self.thread_header = name.into();
        self
    }
}

impl ApprovalPolicy for AutoApprove {
    fn decide(
        &self,
        pending: &[ToolCallRequest],
        context: &ApprovalContext,
    ) -> Vec<ToolApprovalDecision> {
        pending
            .iter()
            .map(|call| approve(call, context, &self.thread_header))
            .collect()
    }
}

/// Approves only tools whose name is allow-listed; denies everything else.
#[derive(Debug, Clone)]
pub struct ToolAllowList {
    allowed: BTreeSet<String>,
    thread_header: String,
}

impl ToolAllowList {
    pub fn new<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: tools.into_iter().map(Into::into).collect(),
            thread_header: DEFAULT_THREAD_HEADER.to_string(),
        }
    }

    pub fn is_allowed(&self, tool_name: &str) -> bool {
        self.allowed.contains(tool_name)
    }
}

impl ApprovalPolicy for ToolAllowList {
    fn decide(
        &self,
        pending: &[ToolCallRequest],
        context: &ApprovalContext,
    ) -> Vec<ToolApprovalDecision> {
        pending
            .iter()
            .map(|call| {
                if self.is_allowed(&call.name) {
                    approve(call, context, &self.thread_header)
                } else {
                    tracing::info!(tool = %call.name, call_id = %call.id, "denying tool call not on allow-list");
                    ToolApprovalDecision {
                        tool_call_id: call.id.clone(),
                        approve: false,
                        headers: BTreeMap::new(),
                    }
                }
            })
            .collect()
    }
}

fn approve(
    call: &ToolCallRequest,
    context: &ApprovalContext,
    thread_header: &str,
) -> ToolApprovalDecision {
    let mut headers = BTreeMap::new();
    headers.insert(
        AUTHORIZATION_HEADER.to_string(),
        format!("Bearer {}", context.bearer_token),
    );
    headers.insert(thread_header.to_string(), context.thread_id.clone());
    ToolApprovalDecision {
        tool_call_id: call.id.clone(),
        approve: true,
        headers,
    }
}
