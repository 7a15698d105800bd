use crate::error::AgentError;
use crate::escalation::ConnectSupervisorTool;
use crate::session::AgentSession;
use crate::tools::ToolRegistry;
use handoff_store::SharedStore;
use std::sync::Arc;

pub const INTRO_INSTRUCTIONS: &str = "Say: \"Hi there! I'm your personal assistant\". \
You are a helpful assistant that collects user information for personalized help.";

pub const GREETING_INSTRUCTIONS: &str = "greet the user and gather information";

/// The entry agent of every session: greets the caller, collects their
/// details and can hand the call to a supervisor.
#[derive(Debug)]
pub struct IntroAgent {
    instructions: String,
    tools: ToolRegistry,
}

impl IntroAgent {
    pub fn create(store: SharedStore) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(ConnectSupervisorTool::new(store)));
        Self {
            instructions: INTRO_INSTRUCTIONS.to_string(),
            tools,
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Opens the conversation with a greeting.
    pub async fn on_enter(&self, session: &AgentSession) -> Result<(), AgentError> {
        tracing::info!("intro agent entered, generating initial reply");
        session.generate_reply(GREETING_INSTRUCTIONS).await
    }
}
