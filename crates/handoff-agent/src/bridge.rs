//! HTTP bridge through which the external runtime calls the agent's tools.
//!
//! - `GET /tools` lists tool schemas.
//! - `POST /tools/{name}` runs a tool; the body holds its JSON arguments and
//!   may be empty. Tool failures still answer `200`; the output text says
//!   what went wrong.

use crate::session::AgentSession;
use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_tools_handler(Extension(session): Extension<Arc<AgentSession>>) -> Json<Value> {
    Json(json!({ "tools": session.agent().tools().schemas() }))
}

async fn call_tool_handler(
    Extension(session): Extension<Arc<AgentSession>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args) => args,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid tool arguments: {}", e) })),
                )
                    .into_response()
            }
        }
    };

    match session.call_tool(&name, args).await {
        Some(output) => Json(json!({ "output": output })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown tool: {}", name) })),
        )
            .into_response(),
    }
}

/// Builds the bridge router for one session.
pub fn router(session: Arc<AgentSession>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(call_tool_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(session))
}
