//! Server configuration loading from file and environment variables.

use crate::middleware::RateLimitConfig;
use handoff_store::StoreConfig;
use handoff_voice::LiveKitConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// LiveKit credentials used to sign join tokens.
    #[serde(default)]
    pub livekit: LiveKitConfig,

    /// Signaling store backend.
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub signaling: SignalingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "handoff_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Bearer-token gate on the `/api` routes.
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,

    /// HS256 shared secret.
    #[serde(default)]
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

/// Per-client fixed-window limits.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

impl RateLimitSettings {
    pub fn limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            window: Duration::from_secs(self.window_secs),
            max: self.max_requests,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalingConfig {
    /// Reject statuses outside the known set instead of writing them.
    #[serde(default)]
    pub strict_status: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("auth is enabled but no JWT secret is configured")]
    MissingJwtSecret,
}

fn env_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `HANDOFF_HOST` overrides `server.host`
/// - `HANDOFF_PORT` overrides `server.port`
/// - `HANDOFF_LOG_LEVEL` overrides `logging.level`
/// - `HANDOFF_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `JWT_SECRET` overrides `auth.jwt_secret`
/// - `HANDOFF_AUTH_ENABLED` overrides `auth.enabled`
/// - `HANDOFF_RATE_LIMIT_WINDOW_SECS` overrides `rate_limit.window_secs`
/// - `HANDOFF_RATE_LIMIT_MAX` overrides `rate_limit.max_requests`
/// - `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET` override `livekit`
/// - `HANDOFF_STORE_BACKEND`, `HANDOFF_SQLITE_PATH`, `FIREBASE_PROJECT_ID`,
///   `FIREBASE_SERVICE_ACCOUNT`, `FIRESTORE_EMULATOR_HOST` override `store`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if auth is enabled without a secret.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Ok(host) = std::env::var("HANDOFF_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("HANDOFF_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("HANDOFF_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("HANDOFF_LOG_JSON") {
        config.logging.json = env_flag(&json);
    }
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Ok(enabled) = std::env::var("HANDOFF_AUTH_ENABLED") {
        config.auth.enabled = env_flag(&enabled);
    }
    if let Ok(window) = std::env::var("HANDOFF_RATE_LIMIT_WINDOW_SECS") {
        if let Ok(parsed) = window.parse() {
            config.rate_limit.window_secs = parsed;
        }
    }
    if let Ok(max) = std::env::var("HANDOFF_RATE_LIMIT_MAX") {
        if let Ok(parsed) = max.parse() {
            config.rate_limit.max_requests = parsed;
        }
    }

    config.livekit.apply_env_overrides();
    config.store.apply_env_overrides();

    if config.auth.enabled && config.auth.jwt_secret.is_empty() {
        return Err(ConfigError::MissingJwtSecret);
    }

    Ok(config)
}
