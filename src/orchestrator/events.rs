//! Progress events emitted while a run is driven to completion.

use std::sync::Arc;

use crate::types::RunStatus;

/// Observable milestones of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    ThreadCreated { thread_id: String },
    MessageCreated { message_id: String },
    RunCreated { run_id: String, status: RunStatus },
    StatusChanged { from: RunStatus, to: RunStatus },
    ApprovalsSubmitted { decisions: usize, approved: usize },
}

/// Callback used for streaming run events.
pub type RunEventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;
