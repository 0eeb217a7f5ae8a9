//! Shared test helpers and a scripted in-memory agents client.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use agentrun::client::AgentsClient;
use agentrun::config::ProjectConfig;
use agentrun::error::{AgentRunError, Result};
use agentrun::orchestrator::PollSettings;
use agentrun::types::*;
use agentrun::util::retry::RetryPolicy;

pub const THREAD_ID: &str = "thread_1";
pub const RUN_ID: &str = "run_1";
pub const AGENT_ID: &str = "asst_1";

/// One scripted answer to `get_run`.
#[derive(Debug, Clone)]
pub enum Step {
    Status(RunStatus),
    NeedsAction(Vec<ToolCallRequest>),
    Failed(RunStatus, Option<String>),
    /// A retryable transport failure (HTTP 503).
    Transient,
    /// A call that does not answer for ten minutes.
    Hang,
}

impl Step {
    pub fn needs_action(ids: &[&str]) -> Self {
        Step::NeedsAction(
            ids.iter()
                .map(|id| ToolCallRequest::new(*id, format!("tool_for_{id}"), "{}"))
                .collect(),
        )
    }

    pub fn failed(message: &str) -> Self {
        Step::Failed(RunStatus::Failed, Some(message.to_string()))
    }
}

/// A mock client that answers `get_run` from a script and records every call.
///
/// The last step of the script repeats forever once reached.
pub struct ScriptedClient {
    initial: RunStatus,
    steps: Mutex<VecDeque<Step>>,
    messages: Vec<Message>,
    agent_exists: bool,
    submit_failures: Mutex<VecDeque<AgentRunError>>,
    calls: Mutex<Vec<&'static str>>,
    submissions: Mutex<Vec<Vec<ToolApprovalDecision>>>,
    tool_resources: Mutex<Option<ToolResources>>,
}

impl ScriptedClient {
    pub fn new(initial: RunStatus, steps: Vec<Step>) -> Self {
        Self {
            initial,
            steps: Mutex::new(steps.into()),
            messages: Vec::new(),
            agent_exists: true,
            submit_failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            tool_resources: Mutex::new(None),
        }
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn without_agent(mut self) -> Self {
        self.agent_exists = false;
        self
    }

    /// Fail the next approval submissions with `errors`, in order.
    pub fn with_submit_failures(self, errors: Vec<AgentRunError>) -> Self {
        *self.submit_failures.lock().unwrap() = errors.into();
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn submissions(&self) -> Vec<Vec<ToolApprovalDecision>> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn received_tool_resources(&self) -> Option<ToolResources> {
        self.tool_resources.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn next_step(&self) -> Option<Step> {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        }
    }
}

pub fn run_with(status: RunStatus) -> Run {
    Run {
        id: RUN_ID.to_string(),
        thread_id: THREAD_ID.to_string(),
        agent_id: AGENT_ID.to_string(),
        status,
        last_error: None,
        required_action: None,
    }
}

impl Step {
    fn into_run(self) -> Result<Run> {
        match self {
            Step::Status(status) => Ok(run_with(status)),
            Step::NeedsAction(tool_calls) => Ok(Run {
                required_action: Some(RequiredAction {
                    kind: "submit_tool_approval".to_string(),
                    tool_calls,
                }),
                ..run_with(RunStatus::RequiresAction)
            }),
            Step::Failed(status, message) => Ok(Run {
                last_error: message.map(|message| RunError {
                    code: Some("server_error".to_string()),
                    message,
                }),
                ..run_with(status)
            }),
            Step::Transient => Err(AgentRunError::api(503, "service unavailable")),
            Step::Hang => Ok(run_with(RunStatus::InProgress)),
        }
    }
}

#[async_trait]
impl AgentsClient for ScriptedClient {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.record("get_agent");
        if !self.agent_exists {
            return Err(AgentRunError::NotFound(format!(
                "No assistant found with id '{agent_id}'."
            )));
        }
        Ok(Agent {
            id: agent_id.to_string(),
            name: Some("helper".to_string()),
            model: None,
        })
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.record("create_thread");
        Ok(Thread {
            id: THREAD_ID.to_string(),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            metadata: Default::default(),
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Message> {
        self.record("create_message");
        Ok(Message {
            id: "msg_user".to_string(),
            thread_id: thread_id.to_string(),
            role,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            content: vec![ContentItem::text(text)],
        })
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _agent_id: &str,
        tool_resources: Option<&ToolResources>,
    ) -> Result<Run> {
        self.record("create_run");
        *self.tool_resources.lock().unwrap() = tool_resources.cloned();
        Ok(run_with(self.initial.clone()))
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
        self.record("get_run");
        match self.next_step() {
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Step::Hang.into_run()
            }
            Some(step) => step.into_run(),
            None => Ok(run_with(RunStatus::InProgress)),
        }
    }

    async fn submit_tool_approvals(
        &self,
        _thread_id: &str,
        _run_id: &str,
        decisions: &[ToolApprovalDecision],
    ) -> Result<Run> {
        self.record("submit");
        if let Some(err) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.submissions.lock().unwrap().push(decisions.to_vec());
        Ok(run_with(RunStatus::RequiresAction))
    }

    async fn list_messages(&self, _thread_id: &str, _order: ListOrder) -> Result<Vec<Message>> {
        self.record("list_messages");
        Ok(self.messages.clone())
    }

    async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
        self.record("cancel_run");
        Ok(run_with(RunStatus::Cancelling))
    }
}

pub fn text_message(id: &str, role: MessageRole, secs: i64, text: &str) -> Message {
    Message {
        id: id.to_string(),
        thread_id: THREAD_ID.to_string(),
        role,
        created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        content: vec![ContentItem::text(text)],
    }
}

pub fn greeting_messages() -> Vec<Message> {
    vec![
        text_message("msg_1", MessageRole::User, 1_700_000_000, "Hello"),
        text_message("msg_2", MessageRole::Assistant, 1_700_000_003, "Hi there"),
    ]
}

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(10),
        multiplier: 1.0,
    }
}

pub fn project_config() -> ProjectConfig {
    ProjectConfig {
        endpoint: "https://example.test/api/projects/demo".to_string(),
        agent_id: AGENT_ID.to_string(),
        api_version: "v1".to_string(),
        poll: PollSettings::default(),
        retry: fast_retry(3),
    }
}
