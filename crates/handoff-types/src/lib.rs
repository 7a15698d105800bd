//! Shared types for the handoff workspace.
//!
//! This crate holds the vocabulary every other crate speaks: the signaling
//! document stored per room, the closed set of request states written into it,
//! and the input rules applied to room and participant names. It has no I/O
//! and no async code so that the store, the agent and the web API can all
//! depend on it without pulling each other in.

pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use validation::{FieldError, FieldRule, ValidationErrors, Validator};

/// Name of the document collection holding one signaling document per room.
pub const ROOMS_COLLECTION: &str = "rooms";

/// Identity suffix that marks a participant as a human supervisor.
pub const SUPERVISOR_IDENTITY_SUFFIX: &str = "-supervisor";

/// Returns `true` if the participant identity belongs to a supervisor.
pub fn is_supervisor_identity(identity: &str) -> bool {
    identity.ends_with(SUPERVISOR_IDENTITY_SUFFIX)
}

/// Handoff state of a room, stored in the `request` field of its document.
///
/// The known states serialize as upper-case strings. Values written by other
/// producers that fall outside the known set are kept verbatim in
/// [`RequestStatus::Custom`] so that reads never fail on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    /// A token was issued and the call is running with the agent only.
    Start,
    /// The agent asked for a supervisor to join.
    Pending,
    /// A supervisor accepted the request.
    Accepted,
    /// The request was declined.
    Rejected,
    /// The handoff finished.
    Completed,
    /// Any other value written through the status-update API.
    Custom(String),
}

impl RequestStatus {
    /// Returns the wire representation of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "START",
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Completed => "COMPLETED",
            Self::Custom(value) => value,
        }
    }

    /// Returns `true` for any status outside the known set.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl From<String> for RequestStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "START" => Self::Start,
            "PENDING" => Self::Pending,
            "ACCEPTED" => Self::Accepted,
            "REJECTED" => Self::Rejected,
            "COMPLETED" => Self::Completed,
            _ => Self::Custom(value),
        }
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Custom(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signaling document kept for every room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDocument {
    /// Identity of the participant the room was issued for.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Name of the room; also the document id.
    #[serde(rename = "roomName")]
    pub room_name: String,
    /// Current handoff state.
    pub request: RequestStatus,
}

impl RoomDocument {
    /// Builds the document written when a join token is issued.
    pub fn started(user_id: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            room_name: room_name.into(),
            request: RequestStatus::Start,
        }
    }
}
