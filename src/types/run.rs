//! Runs, their status machine, and the tool-approval payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One execution attempt of a remote agent against a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    #[serde(default, rename = "assistant_id", alias = "agent_id")]
    pub agent_id: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
}

impl Run {
    /// Tool calls awaiting a decision, if the run is blocked on them.
    ///
    /// Empty unless the status is [`RunStatus::RequiresAction`].
    pub fn pending_tool_calls(&self) -> &[ToolCallRequest] {
        match (&self.status, &self.required_action) {
            (RunStatus::RequiresAction, Some(action)) => &action.tool_calls,
            _ => &[],
        }
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(|e| e.message.clone())
    }
}

/// Error reported by the remote service for a failed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Run lifecycle status.
///
/// Unrecognized wire values decode to [`RunStatus::Unknown`], which is never terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Unknown(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }

    /// Position in the lifecycle; `None` for unknown statuses.
    ///
    /// `InProgress` and `RequiresAction` share a rank since a run alternates between them.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Queued => Some(0),
            Self::InProgress | Self::RequiresAction => Some(1),
            Self::Cancelling => Some(2),
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired => Some(3),
            Self::Unknown(_) => None,
        }
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "requires_action" => Self::RequiresAction,
            "cancelling" | "canceling" => Self::Cancelling,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            "expired" => Self::Expired,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action the remote run is blocked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRequiredAction", into = "RawRequiredAction")]
pub struct RequiredAction {
    /// Wire action type, e.g. `submit_tool_approval`.
    pub kind: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// A remote agent's request to invoke an external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawToolCall")]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Opaque argument payload; never interpreted here.
    pub arguments: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_label: Option<String>,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
            server_label: None,
        }
    }
}

/// Authorization response to one tool call request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolApprovalDecision {
    pub tool_call_id: String,
    pub approve: bool,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Tool resources attached at run creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp: Vec<McpToolResource>,
}

/// Per-server settings for a remotely invoked MCP tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolResource {
    pub server_label: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_approval: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawRequiredAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submit_tool_approval: Option<RawToolCalls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submit_tool_outputs: Option<RawToolCalls>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawToolCalls {
    #[serde(default)]
    tool_calls: Vec<ToolCallRequest>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawToolCall {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<serde_json::Value>,
    #[serde(default)]
    server_label: Option<String>,
    #[serde(default)]
    function: Option<RawFunction>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawFunction {
    name: String,
    #[serde(default)]
    arguments: Option<serde_json::Value>,
}

fn arguments_to_string(value: Option<serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(raw)) => raw,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl From<RawToolCall> for ToolCallRequest {
    fn from(raw: RawToolCall) -> Self {
        let (name, arguments) = match (raw.name, raw.function) {
            (Some(name), _) => (name, raw.arguments),
            (None, Some(function)) => (function.name, function.arguments),
            (None, None) => (String::new(), raw.arguments),
        };
        Self {
            id: raw.id,
            name,
            arguments: arguments_to_string(arguments),
            server_label: raw.server_label,
        }
    }
}

impl From<RawRequiredAction> for RequiredAction {
    fn from(raw: RawRequiredAction) -> Self {
        let tool_calls = raw
            .submit_tool_approval
            .or(raw.submit_tool_outputs)
            .map(|calls| calls.tool_calls)
            .unwrap_or_default();
        Self {
            kind: raw.kind,
            tool_calls,
        }
    }
}

impl From<RequiredAction> for RawRequiredAction {
    fn from(action: RequiredAction) -> Self {
        let calls = Some(RawToolCalls {
            tool_calls: action.tool_calls,
        });
        if action.kind == "submit_tool_outputs" {
            Self {
                kind: action.kind,
                submit_tool_outputs: calls,
                ..Default::default()
            }
        } else {
            Self {
                kind: action.kind,
                submit_tool_approval: calls,
                ..Default::default()
            }
        }
    }
}
