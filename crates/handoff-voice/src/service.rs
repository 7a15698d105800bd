use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use std::time::Duration;

/// Mints LiveKit join tokens.
#[derive(Debug, Clone)]
pub struct VoiceService {
    config: LiveKitConfig,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        Self { config }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.config.token_ttl_seconds)
    }

    /// Returns a signed token that lets `identity` join `room_name` and
    /// nothing else, valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// `VoiceError::MissingCredentials` if the key pair is not configured,
    /// `VoiceError::LiveKit` if signing fails.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        identity: &str,
    ) -> Result<String, VoiceError> {
        if !self.config.has_credentials() {
            return Err(VoiceError::MissingCredentials);
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(identity)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                ..Default::default()
            })
            .with_ttl(self.token_ttl());

        token.to_jwt().map_err(VoiceError::LiveKit)
    }
}
