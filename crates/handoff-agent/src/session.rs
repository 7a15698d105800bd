use crate::agent::IntroAgent;
use crate::error::AgentError;
use crate::runtime::ModelRuntime;
use serde_json::Value;
use std::sync::Arc;

/// Per-session data visible to tools. Lives as long as the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUserData {
    room_name: Option<String>,
}

impl SessionUserData {
    pub fn for_room(room_name: Option<String>) -> Self {
        Self {
            room_name: room_name.filter(|name| !name.is_empty()),
        }
    }

    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }
}

/// A running conversation between the intro agent and one room.
pub struct AgentSession {
    agent: IntroAgent,
    userdata: SessionUserData,
    runtime: Arc<dyn ModelRuntime>,
}

impl AgentSession {
    pub fn new(
        agent: IntroAgent,
        userdata: SessionUserData,
        runtime: Arc<dyn ModelRuntime>,
    ) -> Self {
        Self {
            agent,
            userdata,
            runtime,
        }
    }

    pub fn agent(&self) -> &IntroAgent {
        &self.agent
    }

    pub fn userdata(&self) -> &SessionUserData {
        &self.userdata
    }

    /// Registers the agent with the runtime and runs its entry hook.
    pub async fn start(&self) -> Result<(), AgentError> {
        tracing::info!(room = ?self.userdata.room_name(), "starting agent session");
        self.runtime
            .start_session(
                self.userdata.room_name(),
                self.agent.instructions(),
                &self.agent.tools().schemas(),
            )
            .await?;
        self.agent.on_enter(self).await
    }

    /// Asks the runtime to speak, steered by `instructions`.
    pub async fn generate_reply(&self, instructions: &str) -> Result<(), AgentError> {
        self.runtime
            .generate_reply(self.userdata.room_name(), instructions)
            .await
    }

    /// Runs a tool on behalf of the runtime. `None` if the tool is unknown.
    pub async fn call_tool(&self, name: &str, args: Value) -> Option<String> {
        self.agent.tools().invoke(name, &self.userdata, args).await
    }
}
