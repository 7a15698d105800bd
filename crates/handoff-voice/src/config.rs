use serde::Deserialize;
use std::fmt;

/// Join tokens expire after ten minutes unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 600;

fn default_token_ttl_seconds() -> u64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

#[derive(Clone, Deserialize)]
pub struct LiveKitConfig {
    /// Server URL, used for Room Service calls.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Lifetime of minted join tokens, in seconds.
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }

    /// Both halves of the signing key pair are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Applies `LIVEKIT_URL`, `LIVEKIT_API_KEY` and `LIVEKIT_API_SECRET`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LIVEKIT_URL") {
            self.url = url;
        }
        if let Ok(key) = std::env::var("LIVEKIT_API_KEY") {
            self.api_key = key;
        }
        if let Ok(secret) = std::env::var("LIVEKIT_API_SECRET") {
            self.api_secret = secret;
        }
    }
}
