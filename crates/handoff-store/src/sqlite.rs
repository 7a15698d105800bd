use crate::{RoomStore, StoreError};
use async_trait::async_trait;
use handoff_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use handoff_types::{RequestStatus, RoomDocument, ROOMS_COLLECTION};
use rusqlite::OptionalExtension;

/// Room documents kept in the `rooms` table of a local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and applies
    /// pending migrations.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let pool = create_pool(path, DbRuntimeSettings::default())?;
        {
            let conn = pool.get()?;
            let applied = run_migrations(&conn)?;
            if applied > 0 {
                tracing::info!(count = applied, path, "applied database migrations");
            }
        }
        Ok(Self { pool })
    }

    /// Wraps an already-migrated pool.
    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Database(format!("task join error: {}", e)))?
    }
}

#[async_trait]
impl RoomStore for SqliteStore {
    async fn set_room(&self, doc: &RoomDocument) -> Result<(), StoreError> {
        let doc = doc.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO rooms (room_name, user_id, request) VALUES (?1, ?2, ?3)
                 ON CONFLICT(room_name) DO UPDATE SET
                     user_id = excluded.user_id,
                     request = excluded.request,
                     updated_at = datetime('now')",
                rusqlite::params![doc.room_name, doc.user_id, doc.request.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn update_status(
        &self,
        room_name: &str,
        status: &RequestStatus,
    ) -> Result<(), StoreError> {
        let room_name = room_name.to_string();
        let status = status.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE rooms SET request = ?2, updated_at = datetime('now')
                 WHERE room_name = ?1",
                rusqlite::params![room_name, status.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!(
                    "No document to update: {}/{}",
                    ROOMS_COLLECTION, room_name
                )));
            }
            Ok(())
        })
        .await
    }

    async fn get_room(&self, room_name: &str) -> Result<Option<RoomDocument>, StoreError> {
        let room_name = room_name.to_string();
        self.with_conn(move |conn| {
            let doc = conn
                .query_row(
                    "SELECT user_id, room_name, request FROM rooms WHERE room_name = ?1",
                    [&room_name],
                    |row| {
                        Ok(RoomDocument {
                            user_id: row.get(0)?,
                            room_name: row.get(1)?,
                            request: RequestStatus::from(row.get::<_, String>(2)?),
                        })
                    },
                )
                .optional()?;
            Ok(doc)
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
