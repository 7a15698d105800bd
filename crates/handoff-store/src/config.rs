use serde::Deserialize;
use std::fmt;

/// Which backend holds the room documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Firestore,
    Sqlite,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

fn default_sqlite_path() -> String {
    "handoff.db".to_string()
}

/// `[store]` section shared by the web API and the agent worker.
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite file used by the `sqlite` backend.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Google Cloud project id. Falls back to the service account's own
    /// `project_id` when unset.
    #[serde(default)]
    pub firestore_project_id: Option<String>,

    /// Service account key, either inline JSON or a path to the key file.
    #[serde(default)]
    pub firestore_credentials: Option<String>,

    /// `host:port` of a Firestore emulator. Disables authentication.
    #[serde(default)]
    pub firestore_emulator_host: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: default_sqlite_path(),
            firestore_project_id: None,
            firestore_credentials: None,
            firestore_emulator_host: None,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("sqlite_path", &self.sqlite_path)
            .field("firestore_project_id", &self.firestore_project_id)
            .field(
                "firestore_credentials",
                &self.firestore_credentials.as_ref().map(|_| "[REDACTED]"),
            )
            .field("firestore_emulator_host", &self.firestore_emulator_host)
            .finish()
    }
}

impl StoreConfig {
    /// Applies environment overrides:
    ///
    /// - `HANDOFF_STORE_BACKEND` overrides `backend`
    /// - `HANDOFF_SQLITE_PATH` overrides `sqlite_path`
    /// - `FIREBASE_PROJECT_ID` overrides `firestore_project_id`
    /// - `FIREBASE_SERVICE_ACCOUNT` overrides `firestore_credentials`
    /// - `FIRESTORE_EMULATOR_HOST` overrides `firestore_emulator_host`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(backend) = std::env::var("HANDOFF_STORE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => self.backend = parsed,
                Err(e) => tracing::warn!("ignoring HANDOFF_STORE_BACKEND: {}", e),
            }
        }
        if let Ok(path) = std::env::var("HANDOFF_SQLITE_PATH") {
            self.sqlite_path = path;
        }
        if let Ok(project) = std::env::var("FIREBASE_PROJECT_ID") {
            self.firestore_project_id = Some(project);
        }
        if let Ok(credentials) = std::env::var("FIREBASE_SERVICE_ACCOUNT") {
            self.firestore_credentials = Some(credentials);
        }
        if let Ok(host) = std::env::var("FIRESTORE_EMULATOR_HOST") {
            if !host.trim().is_empty() {
                self.firestore_emulator_host = Some(host);
            }
        }
    }
}
