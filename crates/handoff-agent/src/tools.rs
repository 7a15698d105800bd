//! Tools the model runtime may call during a session.

use crate::session::SessionUserData;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// A capability exposed to the model runtime.
///
/// Tools always answer with text meant for the model to relay to the caller.
/// Failures are described in that text; they never surface as errors.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the runtime uses in function calls.
    fn name(&self) -> &str;

    /// Tells the model when to call the tool.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments.
    fn parameters(&self) -> Value;

    async fn execute(&self, session: &SessionUserData, args: Value) -> String;

    /// OpenAI function-calling schema for this tool.
    fn to_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}

/// The set of tools attached to an agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.to_schema()).collect()
    }

    /// Runs the named tool. Returns `None` if no such tool is registered.
    pub async fn invoke(
        &self,
        name: &str,
        session: &SessionUserData,
        args: Value,
    ) -> Option<String> {
        let tool = self.get(name)?;
        tracing::info!(tool = name, room = ?session.room_name(), "invoking tool");
        let output = tool.execute(session, args).await;
        tracing::debug!(tool = name, output = %output, "tool finished");
        Some(output)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Schema of a tool that accepts no arguments.
pub fn no_arguments_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

/// Accepts `null` and `{}` as "no arguments".
pub fn is_empty_arguments(args: &Value) -> bool {
    match args {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
