//! The seam to the external speech/LLM runtime.

use crate::error::AgentError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const RUNTIME_TIMEOUT: Duration = Duration::from_secs(10);

/// Whatever drives speech and the model for a session.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Hands the agent's system instructions and tool schemas to the runtime.
    async fn start_session(
        &self,
        room: Option<&str>,
        instructions: &str,
        tools: &[Value],
    ) -> Result<(), AgentError>;

    /// Asks the runtime to produce a spoken reply steered by `instructions`.
    async fn generate_reply(&self, room: Option<&str>, instructions: &str)
        -> Result<(), AgentError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStart<'a> {
    room: Option<&'a str>,
    instructions: &'a str,
    tools: &'a [Value],
    tool_endpoint: Option<&'a str>,
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    room: Option<&'a str>,
    instructions: &'a str,
}

/// Posts session and reply requests to an HTTP endpoint. Without an endpoint
/// the requests are only logged, which is enough to run the worker against
/// a runtime that discovers tools through the bridge on its own.
#[derive(Debug, Clone)]
pub struct WebhookRuntime {
    http: reqwest::Client,
    base_url: Option<String>,
    tool_endpoint: Option<String>,
}

impl WebhookRuntime {
    pub fn new(base_url: Option<String>, tool_endpoint: Option<String>) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(RUNTIME_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            tool_endpoint,
        })
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), AgentError> {
        let Some(base) = self.base_url.as_deref() else {
            return Ok(());
        };
        let url = format!("{}{}", base, path);
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Runtime(format!(
                "{} returned {}: {}",
                url, status, text
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ModelRuntime for WebhookRuntime {
    async fn start_session(
        &self,
        room: Option<&str>,
        instructions: &str,
        tools: &[Value],
    ) -> Result<(), AgentError> {
        tracing::info!(?room, tools = tools.len(), "registering session with runtime");
        self.post(
            "/sessions",
            &SessionStart {
                room,
                instructions,
                tools,
                tool_endpoint: self.tool_endpoint.as_deref(),
            },
        )
        .await
    }

    async fn generate_reply(
        &self,
        room: Option<&str>,
        instructions: &str,
    ) -> Result<(), AgentError> {
        tracing::info!(?room, instructions, "requesting reply");
        self.post("/replies", &ReplyRequest { room, instructions })
            .await
    }
}
