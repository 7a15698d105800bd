//! Signaling store for per-room handoff documents.
//!
//! The web API and the voice agent never talk to each other directly; they
//! coordinate through one document per room in the `rooms` collection. This
//! crate defines the [`RoomStore`] seam both processes write through and three
//! backends for it:
//!
//! - [`FirestoreStore`]: Cloud Firestore over its REST API (production).
//! - [`SqliteStore`]: a local SQLite file via `handoff-db`.
//! - [`MemoryStore`]: process-local map for tests and single-process demos.
//!
//! No backend offers compare-and-swap. Concurrent writers to the same room
//! race and the last write wins.

pub mod config;
pub mod error;
pub mod firestore;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use handoff_types::{RequestStatus, RoomDocument};
use std::sync::Arc;

pub use config::{StoreBackend, StoreConfig};
pub use error::StoreError;
pub use firestore::{FirestoreStore, ServiceAccount};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Read/write access to room signaling documents.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Creates or fully overwrites the document for `doc.room_name`.
    async fn set_room(&self, doc: &RoomDocument) -> Result<(), StoreError>;

    /// Overwrites only the `request` field of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the room has no document.
    async fn update_status(
        &self,
        room_name: &str,
        status: &RequestStatus,
    ) -> Result<(), StoreError>;

    /// Reads the document for a room, if any.
    async fn get_room(&self, room_name: &str) -> Result<Option<RoomDocument>, StoreError>;

    /// Short backend label used in logs.
    fn backend(&self) -> &'static str;
}

/// Shared handle to a store, injected into the web API and the agent.
pub type SharedStore = Arc<dyn RoomStore>;

/// Opens the backend selected by `config`.
///
/// # Errors
///
/// Returns `StoreError::Config` when the selected backend is missing required
/// settings, or the backend's own error if it cannot be initialized.
pub fn open_store(config: &StoreConfig) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.sqlite_path)?),
        StoreBackend::Firestore => Arc::new(FirestoreStore::from_config(config)?),
    };

    tracing::info!(backend = store.backend(), "signaling store ready");

    Ok(store)
}
