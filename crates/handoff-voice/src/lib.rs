//! LiveKit integration for the handoff workspace.
//!
//! Two things cross the boundary to the voice provider: join tokens minted
//! for callers (and for the agent), and the participant roster of a room,
//! which the agent worker watches to find out who joined. Media, speech and
//! turn-taking stay with the external runtime.

pub mod config;
pub mod error;
pub mod participants;
pub mod service;

pub use config::{LiveKitConfig, DEFAULT_TOKEN_TTL_SECONDS};
pub use error::VoiceError;
pub use participants::{
    wait_for_participant, LiveKitParticipantWatcher, ParticipantWatcher, RemoteParticipant,
    DEFAULT_POLL_INTERVAL,
};
pub use service::VoiceService;
