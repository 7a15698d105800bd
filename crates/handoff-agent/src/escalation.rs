//! The `connectSupervisor` tool.

use crate::session::SessionUserData;
use crate::tools::{is_empty_arguments, no_arguments_schema, Tool};
use async_trait::async_trait;
use handoff_store::SharedStore;
use handoff_types::RequestStatus;
use serde_json::Value;

pub const CONNECT_SUPERVISOR: &str = "connectSupervisor";

const DESCRIPTION: &str = "Escalate the conversation to a human supervisor when the assistant \
lacks capability or context. Trigger if the LLM is unsure or cannot provide a useful answer.";

pub const NO_ROOM_REPLY: &str =
    "Unable to connect to a supervisor because no room is associated with this session.";
pub const CONNECTING_REPLY: &str = "Connecting to a supervisor...";

/// Marks the session's room as waiting for a supervisor.
pub struct ConnectSupervisorTool {
    store: SharedStore,
}

impl ConnectSupervisorTool {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ConnectSupervisorTool {
    fn name(&self) -> &str {
        CONNECT_SUPERVISOR
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Value {
        no_arguments_schema()
    }

    async fn execute(&self, session: &SessionUserData, args: Value) -> String {
        if !is_empty_arguments(&args) {
            tracing::warn!(%args, "connectSupervisor called with arguments");
            return "Error connecting to a supervisor: this tool takes no arguments".to_string();
        }

        let Some(room_name) = session.room_name() else {
            tracing::error!("room name is missing in session user data");
            return NO_ROOM_REPLY.to_string();
        };

        match self
            .store
            .update_status(room_name, &RequestStatus::Pending)
            .await
        {
            Ok(()) => {
                tracing::info!(room = room_name, "supervisor requested");
                CONNECTING_REPLY.to_string()
            }
            Err(e) => {
                tracing::error!(room = room_name, "failed to request supervisor: {}", e);
                format!("Error connecting to a supervisor: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_store::{MemoryStore, RoomStore};
    use handoff_types::RoomDocument;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn without_room_nothing_is_written() {
        let store = Arc::new(MemoryStore::new());
        let tool = ConnectSupervisorTool::new(store.clone());

        let out = tool
            .execute(&SessionUserData::for_room(None), Value::Null)
            .await;

        assert_eq!(out, NO_ROOM_REPLY);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn marks_room_pending() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_room(&RoomDocument::started("alice", "room-1"))
            .await
            .unwrap();
        let tool = ConnectSupervisorTool::new(store.clone());

        let out = tool
            .execute(
                &SessionUserData::for_room(Some("room-1".to_string())),
                json!({}),
            )
            .await;

        assert_eq!(out, CONNECTING_REPLY);
        let doc = store.get_room("room-1").await.unwrap().unwrap();
        assert_eq!(doc.request, RequestStatus::Pending);
        assert_eq!(doc.user_id, "alice");
    }

    #[tokio::test]
    async fn store_failure_is_described_to_the_model() {
        let store = Arc::new(MemoryStore::new());
        let tool = ConnectSupervisorTool::new(store);

        let out = tool
            .execute(
                &SessionUserData::for_room(Some("unknown-room".to_string())),
                Value::Null,
            )
            .await;

        assert!(
            out.starts_with("Error connecting to a supervisor: No document to update"),
            "{out}"
        );
    }

    #[tokio::test]
    async fn unexpected_arguments_are_refused() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_room(&RoomDocument::started("alice", "room-1"))
            .await
            .unwrap();
        let tool = ConnectSupervisorTool::new(store.clone());

        let out = tool
            .execute(
                &SessionUserData::for_room(Some("room-1".to_string())),
                json!({ "urgent": true }),
            )
            .await;

        assert!(out.starts_with("Error"));
        let doc = store.get_room("room-1").await.unwrap().unwrap();
        assert_eq!(doc.request, RequestStatus::Start);
    }
}
