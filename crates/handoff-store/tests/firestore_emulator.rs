//! Exercises the Firestore backend against a minimal in-process stand-in for
//! the emulator's document endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use handoff_store::{FirestoreStore, RoomStore, StoreError};
use handoff_types::{RequestStatus, RoomDocument};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type Docs = Arc<Mutex<HashMap<String, Map<String, Value>>>>;

#[derive(Deserialize)]
struct PatchParams {
    #[serde(rename = "updateMask.fieldPaths")]
    mask: Option<String>,
    #[serde(rename = "currentDocument.exists")]
    exists: Option<bool>,
}

fn not_found(project: &str, room: &str) -> Response {
    let body = json!({
        "error": {
            "code": 404,
            "message": format!(
                "No document to update: projects/{}/databases/(default)/documents/rooms/{}",
                project, room
            ),
            "status": "NOT_FOUND"
        }
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

async fn patch_doc(
    State(docs): State<Docs>,
    Path((project, _database, room)): Path<(String, String, String)>,
    Query(params): Query<PatchParams>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer owner") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let fields = body["fields"].as_object().cloned().unwrap_or_default();
    let mut docs = docs.lock().unwrap();

    if params.exists == Some(true) && !docs.contains_key(&room) {
        return not_found(&project, &room);
    }

    let doc = match params.mask {
        Some(field) => {
            let doc = docs.entry(room.clone()).or_default();
            if let Some(value) = fields.get(&field) {
                doc.insert(field, value.clone());
            }
            doc.clone()
        }
        None => {
            docs.insert(room.clone(), fields.clone());
            fields
        }
    };

    Json(json!({ "fields": doc })).into_response()
}

async fn get_doc(
    State(docs): State<Docs>,
    Path((project, _database, room)): Path<(String, String, String)>,
) -> Response {
    match docs.lock().unwrap().get(&room) {
        Some(fields) => Json(json!({ "fields": fields })).into_response(),
        None => not_found(&project, &room),
    }
}

async fn spawn_emulator() -> (String, Docs) {
    let docs: Docs = Arc::default();
    let app = Router::new()
        .route(
            "/v1/projects/{project}/databases/{database}/documents/rooms/{room}",
            get(get_doc).patch(patch_doc),
        )
        .with_state(docs.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr.to_string(), docs)
}

#[tokio::test]
async fn set_then_update_keeps_other_fields() {
    let (host, docs) = spawn_emulator().await;
    let store = FirestoreStore::emulator(&host, "demo").unwrap();

    store
        .set_room(&RoomDocument::started("alice", "room-1"))
        .await
        .unwrap();
    store
        .update_status("room-1", &RequestStatus::Pending)
        .await
        .unwrap();

    let doc = store.get_room("room-1").await.unwrap().unwrap();
    assert_eq!(doc.user_id, "alice");
    assert_eq!(doc.room_name, "room-1");
    assert_eq!(doc.request, RequestStatus::Pending);

    let raw = docs.lock().unwrap();
    assert_eq!(raw["room-1"]["request"], json!({ "stringValue": "PENDING" }));
}

#[tokio::test]
async fn set_overwrites_existing_document() {
    let (host, _docs) = spawn_emulator().await;
    let store = FirestoreStore::emulator(&host, "demo").unwrap();

    let mut doc = RoomDocument::started("alice", "room-2");
    doc.request = RequestStatus::Completed;
    store.set_room(&doc).await.unwrap();
    store
        .set_room(&RoomDocument::started("bob", "room-2"))
        .await
        .unwrap();

    let stored = store.get_room("room-2").await.unwrap().unwrap();
    assert_eq!(stored.user_id, "bob");
    assert_eq!(stored.request, RequestStatus::Start);
}

#[tokio::test]
async fn update_of_missing_document_surfaces_backend_message() {
    let (host, docs) = spawn_emulator().await;
    let store = FirestoreStore::emulator(&host, "demo").unwrap();

    let err = store
        .update_status("ghost", &RequestStatus::Pending)
        .await
        .unwrap_err();

    match err {
        StoreError::NotFound(message) => {
            assert!(message.starts_with("No document to update"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(docs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_document_reads_as_none() {
    let (host, _docs) = spawn_emulator().await;
    let store = FirestoreStore::emulator(&host, "demo").unwrap();
    assert!(store.get_room("nobody").await.unwrap().is_none());
}
