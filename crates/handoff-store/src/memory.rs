use crate::{RoomStore, StoreError};
use async_trait::async_trait;
use handoff_types::{RequestStatus, RoomDocument, ROOMS_COLLECTION};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store. Documents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, RoomDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn set_room(&self, doc: &RoomDocument) -> Result<(), StoreError> {
        self.rooms
            .write()
            .await
            .insert(doc.room_name.clone(), doc.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        room_name: &str,
        status: &RequestStatus,
    ) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().await;
        let doc = rooms.get_mut(room_name).ok_or_else(|| {
            StoreError::NotFound(format!(
                "No document to update: {}/{}",
                ROOMS_COLLECTION, room_name
            ))
        })?;
        doc.request = status.clone();
        Ok(())
    }

    async fn get_room(&self, room_name: &str) -> Result<Option<RoomDocument>, StoreError> {
        Ok(self.rooms.read().await.get(room_name).cloned())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
