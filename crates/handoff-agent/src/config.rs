//! Agent worker configuration, loaded from TOML with environment overrides.

use handoff_store::StoreConfig;
use handoff_voice::LiveKitConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub livekit: LiveKitConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Room this worker serves.
    #[serde(default)]
    pub room: Option<String>,

    /// Identity the agent uses in the room. Generated when unset.
    #[serde(default)]
    pub identity: Option<String>,

    /// Address of the tool bridge.
    #[serde(default = "default_bridge_host")]
    pub bridge_host: IpAddr,

    #[serde(default = "default_bridge_port")]
    pub bridge_port: u16,

    /// How long to wait for someone to join before giving up.
    #[serde(default = "default_participant_timeout_secs")]
    pub participant_timeout_secs: u64,

    /// Spacing between roster polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Base URL of the model runtime's webhook API.
    #[serde(default)]
    pub runtime_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_bridge_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_bridge_port() -> u16 {
    8081
}

fn default_participant_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            room: None,
            identity: None,
            bridge_host: default_bridge_host(),
            bridge_port: default_bridge_port(),
            participant_timeout_secs: default_participant_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            runtime_url: None,
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

impl AgentConfig {
    pub fn participant_timeout(&self) -> Duration {
        Duration::from_secs(self.participant_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }

    /// The configured identity, or a fresh `agent-<uuid>`.
    pub fn resolve_identity(&self) -> String {
        self.identity
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("agent-{}", uuid::Uuid::new_v4().simple()))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `HANDOFF_AGENT_ROOM` overrides `agent.room`
/// - `HANDOFF_AGENT_IDENTITY` overrides `agent.identity`
/// - `HANDOFF_AGENT_PORT` overrides `agent.bridge_port`
/// - `HANDOFF_RUNTIME_URL` overrides `agent.runtime_url`
/// - `HANDOFF_LOG_LEVEL` / `HANDOFF_LOG_JSON` override `logging`
/// - the `LIVEKIT_*` and store variables documented on their sections
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

    if let Ok(room) = std::env::var("HANDOFF_AGENT_ROOM") {
        config.agent.room = Some(room);
    }
    if let Ok(identity) = std::env::var("HANDOFF_AGENT_IDENTITY") {
        config.agent.identity = Some(identity);
    }
    if let Ok(port) = std::env::var("HANDOFF_AGENT_PORT") {
        if let Ok(parsed) = port.parse() {
            config.agent.bridge_port = parsed;
        }
    }
    if let Ok(url) = std::env::var("HANDOFF_RUNTIME_URL") {
        config.agent.runtime_url = Some(url).filter(|u| !u.trim().is_empty());
    }
    if let Ok(level) = std::env::var("HANDOFF_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("HANDOFF_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    config.livekit.apply_env_overrides();
    config.store.apply_env_overrides();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bound_the_participant_wait() {
        let config = AgentConfig::default();
        assert_eq!(config.participant_timeout(), Duration::from_secs(300));
        assert_eq!(config.bridge_port, 8081);
    }

    #[test]
    fn parses_agent_section() {
        let config: Config = toml::from_str(
            r#"
            [agent]
            room = "room-1"
            identity = "intro-agent"
            participant_timeout_secs = 30

            [store]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.agent.room.as_deref(), Some("room-1"));
        assert_eq!(config.agent.resolve_identity(), "intro-agent");
        assert_eq!(config.agent.participant_timeout(), Duration::from_secs(30));
        assert_eq!(config.store.backend, handoff_store::StoreBackend::Memory);
    }

    #[test]
    fn generated_identity_is_prefixed() {
        let identity = AgentConfig::default().resolve_identity();
        assert!(identity.starts_with("agent-"));
        assert!(!handoff_types::is_supervisor_identity(&identity));
    }
}
