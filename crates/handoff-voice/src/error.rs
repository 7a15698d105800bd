use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LiveKit API error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("Missing LIVEKIT credentials")]
    MissingCredentials,

    #[error("Room service error: {0}")]
    RoomService(String),

    #[error("no participant joined room '{room}' within {}s", .waited.as_secs())]
    ParticipantTimeout { room: String, waited: Duration },
}
