//! SQLite persistence for the handoff signaling store.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization
//! and embedded SQL migrations. The `sqlite` store backend in
//! `handoff-store` runs on top of this crate when no document database is
//! configured.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
