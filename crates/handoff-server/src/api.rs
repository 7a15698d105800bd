//! Token and room-status handlers.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use handoff_store::StoreError;
use handoff_types::validation::{
    FieldError, ValidationErrors, Validator, PARTICIPANT_NAME, ROOM_NAME, STATUS,
};
use handoff_types::{RequestStatus, RoomDocument};
use handoff_voice::VoiceError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Response body for `POST /api/createToken`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTokenResponse {
    pub token: String,
}

/// Response body for `POST /api/updateRoomStatus`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRoomStatusResponse {
    pub message: String,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input")]
    Validation(#[from] ValidationErrors),

    #[error("Missing LIVEKIT credentials")]
    MissingCredentials,

    #[error("Failed to create token: {0}")]
    TokenSigning(String),

    #[error("{0}")]
    Store(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid input", "details": errors.details() }),
            ),
            ApiError::MissingCredentials => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Missing LIVEKIT credentials" }),
            ),
            ApiError::TokenSigning(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to create token", "details": details }),
            ),
            ApiError::Store(message) => {
                let message = if message.is_empty() {
                    "Internal server error".to_string()
                } else {
                    message
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": message }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::MissingCredentials => ApiError::MissingCredentials,
            other => ApiError::TokenSigning(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e.to_string())
    }
}

/// Parses a request body as JSON. Bodies that are not JSON at all are
/// reported like any other invalid input.
fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        ApiError::Validation(ValidationErrors {
            errors: vec![FieldError {
                field: "body",
                message: format!("Malformed JSON: {}", e),
            }],
        })
    })
}

/// Handler for `POST /api/createToken`.
///
/// Mints a join token for `participantName` in `roomName` and records the
/// room as `START`. A failed store write is logged and does not fail the
/// request; the caller still gets a working token.
pub async fn create_token_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreateTokenResponse>, ApiError> {
    let body = parse_body(&body)?;
    let mut v = Validator::new(&body)?;
    let participant_name = v.string(&PARTICIPANT_NAME);
    let room_name = v.string(&ROOM_NAME);
    v.finish()?;

    let token = state
        .voice_service
        .generate_join_token(&room_name, &participant_name)?;

    let doc = RoomDocument::started(&participant_name, &room_name);
    match state.store.set_room(&doc).await {
        Ok(()) => tracing::info!(room = %room_name, "set room document"),
        Err(e) => tracing::error!(
            room = %room_name,
            backend = state.store.backend(),
            "failed to set room document: {}",
            e
        ),
    }

    Ok(Json(CreateTokenResponse { token }))
}

/// Handler for `POST /api/updateRoomStatus`.
///
/// Overwrites only the `request` field of an existing room document.
pub async fn update_room_status_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UpdateRoomStatusResponse>, ApiError> {
    let body = parse_body(&body)?;
    let mut v = Validator::new(&body)?;
    let room_name = v.string(&ROOM_NAME);
    let raw_status = v.string(&STATUS);

    let status = RequestStatus::from(raw_status);
    if status.is_custom() && !status.as_str().is_empty() {
        if state.strict_status {
            v.reject(STATUS.name, "Unknown request status");
        } else {
            tracing::warn!(room = %room_name, status = %status, "writing unknown request status");
        }
    }
    v.finish()?;

    state
        .store
        .update_status(&room_name, &status)
        .await
        .map_err(|e| {
            tracing::error!(room = %room_name, "error updating room: {}", e);
            ApiError::from(e)
        })?;

    tracing::info!(room = %room_name, status = %status, "room status updated");

    Ok(Json(UpdateRoomStatusResponse {
        message: "Room status updated successfully".to_string(),
    }))
}
