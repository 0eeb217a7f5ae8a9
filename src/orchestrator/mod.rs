//! Run orchestration: create the run, poll it to a terminal state, and resolve
//! tool approvals whenever the run blocks on them.
//!
//! The poll loop is the only suspension point. Each wait and each remote call
//! inside the loop races the caller's [`CancellationToken`], and the whole
//! loop is bounded by [`PollSettings::run_timeout`] and, optionally,
//! [`PollSettings::max_polls`].

pub mod events;

pub use events::{RunEvent, RunEventSink};

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::approval::{ApprovalContext, ApprovalPolicy, AutoApprove};
use crate::client::AgentsClient;
use crate::error::{AgentRunError, Result};
use crate::types::{ListOrder, Message, MessageRole, Run, RunStatus, ToolResources};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

/// Upper bound on the best-effort remote cancel issued after a local abort.
const REMOTE_CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll cadence and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait between status polls.
    pub interval: Duration,
    /// Total time allowed from run creation to a terminal status.
    pub run_timeout: Duration,
    /// Optional cap on the number of status polls.
    pub max_polls: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            run_timeout: Duration::from_secs(300),
            max_polls: None,
        }
    }
}

/// Input for one run.
#[derive(Clone, Builder)]
pub struct RunRequest {
    #[builder(into)]
    pub agent_id: String,
    #[builder(into)]
    pub prompt: String,
    /// Forwarded to approved tool calls; not used to authenticate the client itself.
    #[builder(into)]
    pub bearer_token: String,
    pub tool_resources: Option<ToolResources>,
}

impl std::fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRequest")
            .field("agent_id", &self.agent_id)
            .field("prompt", &self.prompt)
            .field("bearer_token", &"..")
            .field("tool_resources", &self.tool_resources)
            .finish()
    }
}

/// A completed run and its thread's messages in ascending order.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub thread_id: String,
    pub run: Run,
    pub messages: Vec<Message>,
    /// Number of approval submissions sent during the run.
    pub approval_rounds: u32,
}

/// Drives a single run from creation to a terminal status.
pub struct RunOrchestrator {
    client: Arc<dyn AgentsClient>,
    policy: Arc<dyn ApprovalPolicy>,
    poll: PollSettings,
    retry: RetryPolicy,
    event_sink: Option<RunEventSink>,
}

impl RunOrchestrator {
    /// Orchestrator with the auto-approve policy and default limits.
    pub fn new(client: Arc<dyn AgentsClient>) -> Self {
        Self {
            client,
            policy: Arc::new(AutoApprove::default()),
            poll: PollSettings::default(),
            retry: RetryPolicy::default(),
            event_sink: None,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn ApprovalPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Create a thread, post the prompt, run the agent, and wait for completion.
    ///
    /// Returns [`AgentRunError::RunFailed`] for any terminal status other than
    /// completed; the thread's messages are only listed after completion.
    pub async fn execute(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        if cancel.is_cancelled() {
            return Err(AgentRunError::Cancelled);
        }

        let thread = self.client.create_thread().await?;
        tracing::info!(thread_id = %thread.id, "created thread");
        self.emit(RunEvent::ThreadCreated {
            thread_id: thread.id.clone(),
        });

        let message = self
            .client
            .create_message(&thread.id, MessageRole::User, &request.prompt)
            .await?;
        self.emit(RunEvent::MessageCreated {
            message_id: message.id.clone(),
        });

        if cancel.is_cancelled() {
            return Err(AgentRunError::Cancelled);
        }

        let run = self
            .client
            .create_run(&thread.id, &request.agent_id, request.tool_resources.as_ref())
            .await?;
        tracing::info!(thread_id = %thread.id, run_id = %run.id, status = %run.status, "created run");
        self.emit(RunEvent::RunCreated {
            run_id: run.id.clone(),
            status: run.status.clone(),
        });

        let run_id = run.id.clone();
        let context = ApprovalContext::new(request.bearer_token.clone(), thread.id.clone());
        let (run, approval_rounds) = match self.wait_for_run(run, &context, cancel).await {
            Ok(finished) => finished,
            Err(err) => {
                if matches!(
                    err,
                    AgentRunError::Cancelled
                        | AgentRunError::Timeout(_)
                        | AgentRunError::PollLimitExceeded(_)
                ) {
                    self.cancel_remote(&thread.id, &run_id).await;
                }
                return Err(err);
            }
        };

        if run.status != RunStatus::Completed {
            tracing::warn!(run_id = %run.id, status = %run.status, "run ended without completing");
            return Err(AgentRunError::RunFailed {
                status: run.status.clone(),
                message: run.last_error_message(),
            });
        }

        let messages = self
            .retry
            .execute(|| self.client.list_messages(&thread.id, ListOrder::Ascending))
            .await?;
        tracing::debug!(thread_id = %thread.id, count = messages.len(), "listed messages");

        Ok(RunOutcome {
            thread_id: thread.id,
            run,
            messages,
            approval_rounds,
        })
    }

    /// Poll `run` until it reaches a terminal status, resolving tool approvals
    /// along the way. Returns the terminal run and the number of submissions.
    pub async fn wait_for_run(
        &self,
        run: Run,
        context: &ApprovalContext,
        cancel: &CancellationToken,
    ) -> Result<(Run, u32)> {
        let deadline = Instant::now() + self.poll.run_timeout;
        let thread_id = context.thread_id.clone();
        let run_id = run.id.clone();
        let mut decided: HashSet<String> = HashSet::new();
        let mut current = run;
        let mut polls = 0u32;
        let mut submissions = 0u32;

        loop {
            if current.status.is_terminal() {
                return Ok((current, submissions));
            }
            match &current.status {
                RunStatus::RequiresAction => {
                    if self
                        .resolve_required_action(&current, context, &mut decided, deadline, cancel)
                        .await?
                    {
                        submissions += 1;
                    }
                }
                RunStatus::Unknown(raw) => {
                    tracing::warn!(run_id = %run_id, status = %raw, "unrecognized run status; continuing to poll");
                }
                _ => {}
            }

            if let Some(max_polls) = self.poll.max_polls {
                if polls >= max_polls {
                    tracing::warn!(run_id = %run_id, polls, "poll limit reached");
                    return Err(AgentRunError::PollLimitExceeded(max_polls));
                }
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(run_id = %run_id, polls, "run timed out");
                return Err(AgentRunError::Timeout(
                    self.poll.run_timeout.as_millis() as u64,
                ));
            }

            let wait = self.poll.interval.min(deadline - now);
            until_cancelled(cancel, async {
                tokio::time::sleep(wait).await;
                Ok(())
            })
            .await?;

            polls += 1;
            let next = self
                .within_deadline(
                    deadline,
                    cancel,
                    self.retry.execute(|| self.client.get_run(&thread_id, &run_id)),
                )
                .await?;
            self.observe_transition(&run_id, &current.status, &next.status);
            current = next;
        }
    }

    /// Decide and submit the undecided pending calls of a needs-action round.
    ///
    /// Returns whether a submission was sent. Calls decided in an earlier round
    /// are not resubmitted if a stale poll still reports them.
    async fn resolve_required_action(
        &self,
        run: &Run,
        context: &ApprovalContext,
        decided: &mut HashSet<String>,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let pending: Vec<_> = run
            .pending_tool_calls()
            .iter()
            .filter(|call| !decided.contains(&call.id))
            .cloned()
            .collect();

        if pending.is_empty() {
            tracing::debug!(run_id = %run.id, "needs-action round with nothing undecided; skipping submission");
            return Ok(false);
        }

        let mut proposed = self.policy.decide(&pending, context);
        let mut decisions = Vec::with_capacity(pending.len());
        for call in &pending {
            match proposed.iter().position(|d| d.tool_call_id == call.id) {
                Some(index) => decisions.push(proposed.remove(index)),
                None => {
                    return Err(AgentRunError::InvalidState(format!(
                        "approval policy left tool call {} ({}) undecided",
                        call.id, call.name
                    )))
                }
            }
        }
        if !proposed.is_empty() {
            tracing::warn!(
                run_id = %run.id,
                dropped = proposed.len(),
                "discarding approval decisions for calls that are not pending"
            );
        }

        let approved = decisions.iter().filter(|d| d.approve).count();
        tracing::info!(
            run_id = %run.id,
            decisions = decisions.len(),
            approved,
            "submitting tool approvals"
        );
        self.within_deadline(
            deadline,
            cancel,
            self.retry.execute(|| {
                self.client
                    .submit_tool_approvals(&context.thread_id, &run.id, &decisions)
            }),
        )
        .await?;

        decided.extend(pending.into_iter().map(|call| call.id));
        self.emit(RunEvent::ApprovalsSubmitted {
            decisions: decisions.len(),
            approved,
        });
        Ok(true)
    }

    fn observe_transition(&self, run_id: &str, from: &RunStatus, to: &RunStatus) {
        if from == to {
            return;
        }
        if let (Some(before), Some(after)) = (from.rank(), to.rank()) {
            if after < before {
                tracing::warn!(run_id, from = %from, to = %to, "run status regressed");
            }
        }
        tracing::debug!(run_id, from = %from, to = %to, "run status changed");
        self.emit(RunEvent::StatusChanged {
            from: from.clone(),
            to: to.clone(),
        });
    }

    async fn cancel_remote(&self, thread_id: &str, run_id: &str) {
        match with_timeout(REMOTE_CANCEL_TIMEOUT, self.client.cancel_run(thread_id, run_id)).await
        {
            Ok(run) => {
                tracing::info!(run_id, status = %run.status, "requested remote run cancellation")
            }
            Err(err) => {
                tracing::warn!(run_id, error = %err, "could not cancel remote run")
            }
        }
    }

    /// Race a remote call against cancellation and the run deadline.
    async fn within_deadline<T>(
        &self,
        deadline: Instant,
        cancel: &CancellationToken,
        future: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentRunError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => {
                Err(AgentRunError::Timeout(self.poll.run_timeout.as_millis() as u64))
            }
            result = future => result,
        }
    }

    fn emit(&self, event: RunEvent) {
        if let Some(sink) = &self.event_sink {
            sink(event);
        }
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentRunError::Cancelled),
        result = future => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_poll_settings() {
        let poll = PollSettings::default();
        assert_eq!(poll.interval, Duration::from_millis(500));
        assert_eq!(poll.run_timeout, Duration::from_secs(300));
        assert_eq!(poll.max_polls, None);
    }

    #[test]
    fn run_request_builder_and_redacted_debug() {
        let request = RunRequest::builder()
            .agent_id("asst_1")
            .prompt("Hello")
            .bearer_token("secret-token")
            .build();
        assert_eq!(request.agent_id, "asst_1");
        assert!(request.tool_resources.is_none());
        assert!(!format!("{request:?}").contains("secret-token"));
    }

    #[tokio::test]
    async fn until_cancelled_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = until_cancelled(&cancel, async { Ok::<_, AgentRunError>(1) }).await;
        assert!(matches!(result, Err(AgentRunError::Cancelled)));
    }
}
