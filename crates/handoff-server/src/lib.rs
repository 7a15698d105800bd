//! Web API of the handoff backend.
//!
//! Two routes matter to clients: `POST /api/createToken` mints a LiveKit join
//! token and records the room as `START`, and `POST /api/updateRoomStatus`
//! moves a room's signaling document along. Both sit behind an optional
//! bearer-token gate and a per-client rate limiter.

pub mod api;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use handoff_store::SharedStore;
use handoff_voice::VoiceService;
use middleware::{JwtAuth, RateLimiter};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Signaling store for room documents.
    pub store: SharedStore,
    /// Join-token minting.
    pub voice_service: Arc<VoiceService>,
    /// Bearer-token verifier. `None` leaves the API open.
    pub auth: Option<JwtAuth>,
    /// `None` disables rate limiting.
    pub rate_limiter: Option<RateLimiter>,
    /// Reject statuses outside the known set.
    pub strict_status: bool,
}

impl AppState {
    /// Builds the state described by a loaded configuration.
    pub fn from_config(
        config: &config::Config,
        store: SharedStore,
        voice_service: Arc<VoiceService>,
    ) -> Self {
        Self {
            store,
            voice_service,
            auth: config
                .auth
                .enabled
                .then(|| JwtAuth::new(&config.auth.jwt_secret)),
            rate_limiter: config
                .rate_limit
                .enabled
                .then(|| RateLimiter::new(config.rate_limit.limiter_config())),
            strict_status: config.signaling.strict_status,
        }
    }
}

/// Request bodies here are two short strings.
const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let mut api_routes = Router::new()
        .route("/api/createToken", post(api::create_token_handler))
        .route(
            "/api/updateRoomStatus",
            post(api::update_room_status_handler),
        );

    if state.auth.is_some() {
        api_routes = api_routes.layer(axum::middleware::from_fn(middleware::auth_middleware));
    }
    if state.rate_limiter.is_some() {
        api_routes =
            api_routes.layer(axum::middleware::from_fn(middleware::rate_limit_middleware));
    }

    Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
