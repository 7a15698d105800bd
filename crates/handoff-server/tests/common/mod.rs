#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use handoff_server::middleware::{JwtAuth, RateLimitConfig, RateLimiter};
use handoff_server::AppState;
use handoff_store::{MemoryStore, RoomStore, SharedStore, StoreError};
use handoff_types::{RequestStatus, RoomDocument};
use handoff_voice::{LiveKitConfig, VoiceService};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const API_KEY: &str = "APItestkey";
pub const API_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";
pub const JWT_SECRET: &str = "jwt-test-secret";

pub fn voice_service() -> Arc<VoiceService> {
    Arc::new(VoiceService::new(LiveKitConfig::new(
        "wss://livekit.test",
        API_KEY,
        API_SECRET,
    )))
}

/// Open API, no rate limit, memory store.
pub fn state(store: SharedStore) -> AppState {
    AppState {
        store,
        voice_service: voice_service(),
        auth: None,
        rate_limiter: None,
        strict_status: false,
    }
}

pub fn with_rate_limit(mut state: AppState, max: u32, window: Duration) -> AppState {
    state.rate_limiter = Some(RateLimiter::new(RateLimitConfig { window, max }));
    state
}

pub fn with_auth(mut state: AppState) -> AppState {
    state.auth = Some(JwtAuth::new(JWT_SECRET));
    state
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    let mut request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    request
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// A store whose every call fails the way an unreachable backend would.
pub struct FailingStore;

#[async_trait]
impl RoomStore for FailingStore {
    async fn set_room(&self, _doc: &RoomDocument) -> Result<(), StoreError> {
        Err(StoreError::Backend {
            status: 503,
            message: "backend unavailable".to_string(),
        })
    }

    async fn update_status(
        &self,
        _room_name: &str,
        _status: &RequestStatus,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend {
            status: 503,
            message: "backend unavailable".to_string(),
        })
    }

    async fn get_room(&self, _room_name: &str) -> Result<Option<RoomDocument>, StoreError> {
        Ok(None)
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}
