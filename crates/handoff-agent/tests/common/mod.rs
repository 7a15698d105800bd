#![allow(dead_code)]

use async_trait::async_trait;
use handoff_agent::{AgentError, AgentSession, IntroAgent, ModelRuntime, SessionUserData};
use handoff_store::{MemoryStore, RoomStore};
use handoff_types::RoomDocument;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Records every call the session makes into the runtime.
#[derive(Default)]
pub struct RecordingRuntime {
    pub sessions: Mutex<Vec<(Option<String>, String, usize)>>,
    pub replies: Mutex<Vec<String>>,
}

#[async_trait]
impl ModelRuntime for RecordingRuntime {
    async fn start_session(
        &self,
        room: Option<&str>,
        instructions: &str,
        tools: &[Value],
    ) -> Result<(), AgentError> {
        self.sessions.lock().unwrap().push((
            room.map(str::to_string),
            instructions.to_string(),
            tools.len(),
        ));
        Ok(())
    }

    async fn generate_reply(
        &self,
        _room: Option<&str>,
        instructions: &str,
    ) -> Result<(), AgentError> {
        self.replies.lock().unwrap().push(instructions.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub runtime: Arc<RecordingRuntime>,
    pub session: Arc<AgentSession>,
}

/// A session for `room` backed by a memory store that already holds a
/// `START` document for it.
pub async fn harness(room: Option<&str>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    if let Some(room) = room {
        store
            .set_room(&RoomDocument::started("alice", room))
            .await
            .unwrap();
    }
    let runtime = Arc::new(RecordingRuntime::default());
    let session = Arc::new(AgentSession::new(
        IntroAgent::create(store.clone()),
        SessionUserData::for_room(room.map(str::to_string)),
        runtime.clone(),
    ));
    Harness {
        store,
        runtime,
        session,
    }
}
