mod common;

use axum::http::StatusCode;
use common::{memory_store, post_json, send, state, FailingStore, API_KEY, API_SECRET};
use handoff_server::app;
use handoff_store::RoomStore;
use handoff_types::RequestStatus;
use handoff_voice::{LiveKitConfig, VoiceService};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};
use std::sync::Arc;

fn decode_livekit_token(token: &str) -> Value {
    jsonwebtoken::decode::<Value>(
        token,
        &DecodingKey::from_secret(API_SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .expect("token should verify with the API secret")
    .claims
}

#[tokio::test]
async fn issues_token_and_records_room() {
    let store = memory_store();
    let app = app(state(store.clone()));

    let (status, body) = send(
        &app,
        post_json(
            "/api/createToken",
            r#"{"participantName":"alice","roomName":"room-1"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let claims = decode_livekit_token(body["token"].as_str().unwrap());
    assert_eq!(claims["sub"], "alice");
    assert_eq!(claims["iss"], API_KEY);
    assert_eq!(claims["video"]["roomJoin"], true);
    assert_eq!(claims["video"]["room"], "room-1");

    let doc = store.get_room("room-1").await.unwrap().unwrap();
    assert_eq!(doc.user_id, "alice");
    assert_eq!(doc.room_name, "room-1");
    assert_eq!(doc.request, RequestStatus::Start);
}

#[tokio::test]
async fn reissuing_resets_room_to_start() {
    let store = memory_store();
    let app = app(state(store.clone()));
    let body = r#"{"participantName":"alice","roomName":"room-1"}"#;

    send(&app, post_json("/api/createToken", body)).await;
    store
        .update_status("room-1", &RequestStatus::Pending)
        .await
        .unwrap();
    let (status, _) = send(&app, post_json("/api/createToken", body)).await;

    assert_eq!(status, StatusCode::OK);
    let doc = store.get_room("room-1").await.unwrap().unwrap();
    assert_eq!(doc.request, RequestStatus::Start);
}

#[tokio::test]
async fn reports_one_detail_per_invalid_field() {
    let store = memory_store();
    let app = app(state(store.clone()));

    let (status, body) = send(
        &app,
        post_json(
            "/api/createToken",
            r#"{"participantName":"bad name!","roomName":""}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
    assert_eq!(
        body["details"],
        json!([
            "participantName: Invalid participant name format",
            "roomName: String must contain at least 1 character(s)"
        ])
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn missing_and_mistyped_fields() {
    let app = app(state(memory_store()));

    let (status, body) = send(
        &app,
        post_json("/api/createToken", r#"{"roomName":42}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!([
            "participantName: Required",
            "roomName: Expected string, received number"
        ])
    );
}

#[tokio::test]
async fn enforces_length_limits() {
    let app = app(state(memory_store()));
    let long_name = "a".repeat(51);
    let long_room = "r".repeat(101);

    let (status, body) = send(
        &app,
        post_json(
            "/api/createToken",
            &json!({ "participantName": long_name, "roomName": long_room }).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!([
            "participantName: String must contain at most 50 character(s)",
            "roomName: String must contain at most 100 character(s)"
        ])
    );

    let (status, _) = send(
        &app,
        post_json(
            "/api/createToken",
            &json!({ "participantName": "a".repeat(50), "roomName": "r".repeat(100) })
                .to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn non_object_and_malformed_bodies_are_invalid_input() {
    let app = app(state(memory_store()));

    let (status, body) = send(&app, post_json("/api/createToken", "[1,2]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], json!(["body: Expected object, received array"]));

    let (status, body) = send(&app, post_json("/api/createToken", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
    assert!(body["details"][0]
        .as_str()
        .unwrap()
        .starts_with("body: Malformed JSON"));
}

#[tokio::test]
async fn missing_credentials_fail_before_any_write() {
    let store = memory_store();
    let mut state = state(store.clone());
    state.voice_service = Arc::new(VoiceService::new(LiveKitConfig::default()));
    let app = app(state);

    let (status, body) = send(
        &app,
        post_json(
            "/api/createToken",
            r#"{"participantName":"alice","roomName":"room-1"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Missing LIVEKIT credentials" }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn store_failure_does_not_fail_token_issuance() {
    let app = app(state(Arc::new(FailingStore)));

    let (status, body) = send(
        &app,
        post_json(
            "/api/createToken",
            r#"{"participantName":"alice","roomName":"room-1"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}
