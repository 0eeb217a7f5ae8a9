//! reqwest-backed [`AgentsClient`] for the persistent agents REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{CredentialProvider, DEFAULT_SCOPE};
use crate::config::ProjectConfig;
use crate::error::{AgentRunError, Result};
use crate::types::{
    Agent, ListOrder, Message, MessageRole, Run, Thread, ToolApprovalDecision, ToolResources,
};

use super::AgentsClient;

const REQUEST_ID_HEADER: &str = "x-ms-client-request-id";
const PAGE_LIMIT: &str = "100";

/// HTTP client for one AI project endpoint.
pub struct HttpAgentsClient {
    http: reqwest::Client,
    base: Url,
    api_version: String,
    credential: Arc<dyn CredentialProvider>,
    scope: String,
}

impl std::fmt::Debug for HttpAgentsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAgentsClient")
            .field("base", &self.base.as_str())
            .field("api_version", &self.api_version)
            .field("scope", &self.scope)
            .finish()
    }
}

impl HttpAgentsClient {
    pub fn new(
        endpoint: &str,
        api_version: impl Into<String>,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let base = Url::parse(endpoint).map_err(|e| {
            AgentRunError::Configuration(format!("Invalid project endpoint '{endpoint}': {e}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(AgentRunError::Configuration(format!(
                "Invalid project endpoint '{endpoint}'"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("agentrun/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base,
            api_version: api_version.into(),
            credential,
            scope: DEFAULT_SCOPE.to_string(),
        })
    }

    pub fn from_config(config: &ProjectConfig, credential: Arc<dyn CredentialProvider>) -> Result<Self> {
        Self::new(&config.endpoint, config.api_version.clone(), credential)
    }

    /// Request tokens for a different scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AgentRunError::Configuration("Invalid project endpoint".to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn headers(&self) -> Result<HeaderMap> {
        let token = self.credential.get_token(&self.scope).await?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.token)).map_err(|_| {
            AgentRunError::Authentication("access token contains invalid header characters".into())
        })?;
        headers.insert(AUTHORIZATION, bearer);
        if let Ok(id) = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()) {
            headers.insert(REQUEST_ID_HEADER, id);
        }
        Ok(headers)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        tracing::debug!(%method, path = url.path(), "agents request");
        let mut request = self
            .http
            .request(method, url)
            .headers(self.headers().await?);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body, retry_after_ms));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Serialize)]
struct CreateRunBody<'a> {
    assistant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_resources: Option<&'a ToolResources>,
}

#[async_trait]
impl AgentsClient for HttpAgentsClient {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let url = self.url(&["assistants", agent_id])?;
        self.send(Method::GET, url, None).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        let url = self.url(&["threads"])?;
        self.send(Method::POST, url, Some(json!({}))).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Message> {
        let url = self.url(&["threads", thread_id, "messages"])?;
        let body = json!({ "role": role, "content": text });
        self.send(Method::POST, url, Some(body)).await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        agent_id: &str,
        tool_resources: Option<&ToolResources>,
    ) -> Result<Run> {
        let url = self.url(&["threads", thread_id, "runs"])?;
        let body = serde_json::to_value(CreateRunBody {
            assistant_id: agent_id,
            tool_resources,
        })?;
        self.send(Method::POST, url, Some(body)).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let url = self.url(&["threads", thread_id, "runs", run_id])?;
        self.send(Method::GET, url, None).await
    }

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        decisions: &[ToolApprovalDecision],
    ) -> Result<Run> {
        let url = self.url(&["threads", thread_id, "runs", run_id, "submit_tool_outputs"])?;
        let body = json!({ "tool_approvals": decisions });
        self.send(Method::POST, url, Some(body)).await
    }

    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut url = self.url(&["threads", thread_id, "messages"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("order", order.as_ref());
                query.append_pair("limit", PAGE_LIMIT);
                if let Some(cursor) = &after {
                    query.append_pair("after", cursor);
                }
            }
            let page: ListResponse<Message> = self.send(Method::GET, url, None).await?;
            let page_len = page.data.len();
            messages.extend(page.data);
            match (page.has_more, page.last_id) {
                (true, Some(last_id)) if page_len > 0 => after = Some(last_id),
                _ => break,
            }
        }
        Ok(messages)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let url = self.url(&["threads", thread_id, "runs", run_id, "cancel"])?;
        self.send(Method::POST, url, Some(json!({}))).await
    }
}

/// Map a non-success HTTP status to the error taxonomy.
pub fn status_to_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> AgentRunError {
    let (code, message) = extract_error(body);
    match status {
        401 | 403 => AgentRunError::Authentication(message),
        404 => AgentRunError::NotFound(message),
        429 => AgentRunError::RateLimited { retry_after_ms },
        _ => AgentRunError::Api {
            status,
            code,
            message,
        },
    }
}

/// Pull `error.code` / `error.message` out of a service error body.
fn extract_error(body: &str) -> (Option<String>, String) {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let code = error
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
        .map(str::to_string);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());
    (code, message)
}
