//! Gates in front of the `/api` routes.
//!
//! [`auth_middleware`] checks an HS256 bearer token and hands the caller to
//! handlers as an [`AuthUser`]. [`rate_limit_middleware`] counts requests per
//! client in fixed windows and answers `429` with `Retry-After` once a client
//! is over its cap. Both read their settings from [`AppState`] and pass
//! requests through untouched when their gate is disabled.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::AppState;

/// Claims carried by API bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: u64,
}

/// The authenticated caller, stored in request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: Option<String>,
}

/// Verifies HS256 bearer tokens against a shared secret.
#[derive(Clone)]
pub struct JwtAuth {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // A token is dead the second its `exp` passes.
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<AuthUser, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(AuthUser {
            id: data.claims.id,
            role: data.claims.role,
        })
    }
}

fn unauthorized(body: serde_json::Value) -> Response {
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Extracts the bearer token. A header without the `Bearer ` prefix is taken
/// as the token itself.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// Rejects requests without a valid `Authorization: Bearer <jwt>`.
///
/// On success the caller is available to handlers as an [`AuthUser`]
/// extension.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Response {
    let Some(state) = req.extensions().get::<Arc<AppState>>().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let Some(auth) = state.auth.as_ref() else {
        return next.run(req).await;
    };

    let Some(token) = bearer_token(req.headers()) else {
        return unauthorized(json!({ "error": "Unauthorized - No token provided" }));
    };

    let user = match auth.verify(token) {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(path = %req.uri().path(), "rejected bearer token: {}", e);
            return unauthorized(json!({
                "error": "Unauthorized - Invalid token",
                "details": e.to_string(),
            }));
        }
    };

    tracing::debug!(user_id = %user.id, "authenticated request");
    req.extensions_mut().insert(user);

    next.run(req).await
}

/// Window size and request cap of the fixed-window limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max: u32,
}

/// Result of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Over the cap; `retry_after` is what remains of the current window.
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    start: Instant,
}

/// In-memory fixed-window rate limiter keyed by client address.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts a request from `key` now.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Counts a request from `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };
        let window = self.config.window;

        state.retain(|_, w| now.saturating_duration_since(w.start) <= window);

        if let Some(w) = state.get_mut(key) {
            if w.count >= self.config.max {
                return RateLimitDecision::Limited {
                    retry_after: window.saturating_sub(now.saturating_duration_since(w.start)),
                };
            }
            w.count += 1;
            return RateLimitDecision::Allowed;
        }

        state.insert(
            key.to_string(),
            Window {
                count: 1,
                start: now,
            },
        );
        RateLimitDecision::Allowed
    }

    /// Number of clients with a live window.
    pub fn tracked_clients(&self) -> usize {
        match self.state.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Identifies the client: first `X-Forwarded-For` entry, then `X-Real-IP`,
/// then the peer address, then `"unknown"`.
pub fn client_key(req: &Request<Body>) -> String {
    let headers = req.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn retry_after_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(req: Request<Body>, next: Next) -> Response {
    let Some(state) = req.extensions().get::<Arc<AppState>>().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let key = client_key(&req);
    match limiter.check(&key) {
        RateLimitDecision::Allowed => next.run(req).await,
        RateLimitDecision::Limited { retry_after } => {
            let secs = retry_after_secs(retry_after);
            tracing::warn!(client = %key, retry_after = secs, "rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "Too many requests" })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window: Duration::from_secs(window_secs),
            max,
        })
    }

    #[test]
    fn rate_limiter_allows_within_limit() {
        let limiter = limiter(5, 60);
        let now = Instant::now();
        for _ in 0..5 {
            assert_eq!(limiter.check_at("127.0.0.1", now), RateLimitDecision::Allowed);
        }
        assert!(matches!(
            limiter.check_at("127.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn rate_limiter_different_keys_independent() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        for _ in 0..3 {
            limiter.check_at("10.0.0.1", now);
        }
        assert!(matches!(
            limiter.check_at("10.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));
        assert_eq!(limiter.check_at("10.0.0.2", now), RateLimitDecision::Allowed);
    }

    #[test]
    fn retry_after_is_remaining_window() {
        let limiter = limiter(1, 60);
        let start = Instant::now();
        limiter.check_at("a", start);

        let later = start + Duration::from_millis(20_500);
        match limiter.check_at("a", later) {
            RateLimitDecision::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_millis(39_500));
                assert_eq!(retry_after_secs(retry_after), 40);
            }
            other => panic!("expected limit, got {other:?}"),
        }
    }

    #[test]
    fn new_window_after_expiry_starts_at_one() {
        let limiter = limiter(2, 60);
        let start = Instant::now();
        limiter.check_at("a", start);
        limiter.check_at("a", start);

        let after = start + Duration::from_secs(61);
        assert_eq!(limiter.check_at("a", after), RateLimitDecision::Allowed);
        // Count restarted at 1, so one more fits.
        assert_eq!(limiter.check_at("a", after), RateLimitDecision::Allowed);
        assert!(matches!(
            limiter.check_at("a", after),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn expired_entries_of_other_clients_are_pruned() {
        let limiter = limiter(10, 60);
        let start = Instant::now();
        for i in 0..50 {
            limiter.check_at(&format!("10.0.0.{i}"), start);
        }
        assert_eq!(limiter.tracked_clients(), 50);

        limiter.check_at("192.168.1.1", start + Duration::from_secs(120));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.7");

        let req = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "198.51.100.2");

        let mut req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req), "unknown");
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_key(&req), "127.0.0.1");
    }

    fn token_expiring_at(secret: &str, exp: u64) -> String {
        let claims = Claims {
            id: "user-1".to_string(),
            role: None,
            exp,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now_secs() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn expiry_has_no_grace_period() {
        let auth = JwtAuth::new("secret");

        let stale = token_expiring_at("secret", now_secs() - 2);
        let err = auth.verify(&stale).unwrap_err();
        assert_eq!(
            err.kind(),
            &jsonwebtoken::errors::ErrorKind::ExpiredSignature
        );

        let fresh = token_expiring_at("secret", now_secs() + 60);
        assert_eq!(auth.verify(&fresh).unwrap().id, "user-1");
    }

    #[test]
    fn bearer_prefix_is_optional() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
