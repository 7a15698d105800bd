use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The document targeted by an update does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The backend rejected the request.
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("store authentication failed: {0}")]
    Auth(String),

    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid store configuration: {0}")]
    Config(String),

    #[error("stored document is malformed: {0}")]
    Malformed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<handoff_db::PoolError> for StoreError {
    fn from(e: handoff_db::PoolError) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<handoff_db::MigrationError> for StoreError {
    fn from(e: handoff_db::MigrationError) -> Self {
        Self::Database(e.to_string())
    }
}
