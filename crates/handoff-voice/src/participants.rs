//! Watching a room's roster for the first remote participant.

use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use livekit_api::services::room::RoomClient;
use livekit_api::services::{ServiceError, TwirpError, TwirpErrorCode};
use std::time::Duration;

/// Default spacing between roster polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A participant present in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParticipant {
    pub identity: String,
    pub name: String,
}

/// Source of participant-join notifications for a room.
#[async_trait]
pub trait ParticipantWatcher: Send + Sync {
    /// Resolves once a participant other than `exclude_identity` is present
    /// in `room`. Implementations may wait indefinitely; callers bound the
    /// wait with [`wait_for_participant`].
    async fn next_participant(
        &self,
        room: &str,
        exclude_identity: Option<&str>,
    ) -> Result<RemoteParticipant, VoiceError>;
}

/// Waits for a participant, giving up after `timeout`.
pub async fn wait_for_participant(
    watcher: &dyn ParticipantWatcher,
    room: &str,
    exclude_identity: Option<&str>,
    timeout: Duration,
) -> Result<RemoteParticipant, VoiceError> {
    tracing::info!(room, timeout_secs = timeout.as_secs(), "waiting for participant");

    tokio::time::timeout(timeout, watcher.next_participant(room, exclude_identity))
        .await
        .map_err(|_| VoiceError::ParticipantTimeout {
            room: room.to_string(),
            waited: timeout,
        })?
}

/// Polls LiveKit's Room Service `ListParticipants` until someone shows up.
#[derive(Debug)]
pub struct LiveKitParticipantWatcher {
    room_client: RoomClient,
    poll_interval: Duration,
}

impl LiveKitParticipantWatcher {
    pub fn new(config: &LiveKitConfig, poll_interval: Duration) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        Self {
            room_client,
            poll_interval,
        }
    }
}

#[async_trait]
impl ParticipantWatcher for LiveKitParticipantWatcher {
    async fn next_participant(
        &self,
        room: &str,
        exclude_identity: Option<&str>,
    ) -> Result<RemoteParticipant, VoiceError> {
        loop {
            match self.room_client.list_participants(room).await {
                Ok(participants) => {
                    let joined = participants
                        .into_iter()
                        .find(|p| Some(p.identity.as_str()) != exclude_identity);
                    if let Some(p) = joined {
                        return Ok(RemoteParticipant {
                            identity: p.identity,
                            name: p.name,
                        });
                    }
                }
                Err(e) => roster_error(room, e)?,
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// True when LiveKit answered that the room does not exist (yet).
fn is_room_missing(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::Twirp(TwirpError::Twirp(TwirpErrorCode { code, .. }))
            if code == TwirpErrorCode::NOT_FOUND
    )
}

/// Decides whether a failed roster poll is retried. The room only exists once
/// someone connects, so a missing room means keep polling; credential,
/// transport and server errors end the wait.
fn roster_error(room: &str, err: ServiceError) -> Result<(), VoiceError> {
    if is_room_missing(&err) {
        tracing::debug!(room, "room not created yet: {}", err);
        return Ok(());
    }
    tracing::error!(room, "listing participants failed: {}", err);
    Err(VoiceError::RoomService(err.to_string()))
}
