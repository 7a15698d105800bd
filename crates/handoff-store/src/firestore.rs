//! Cloud Firestore backend over the REST API.
//!
//! Documents live at `projects/{project}/databases/(default)/documents/rooms/{room}`
//! and every field is stored as a `stringValue`. Requests authenticate with an
//! OAuth2 access token obtained through the service-account JWT-bearer flow;
//! the token is cached and refreshed shortly before it expires. When an
//! emulator host is configured authentication is skipped entirely.

use crate::{RoomStore, StoreConfig, StoreError};
use async_trait::async_trait;
use handoff_types::{RequestStatus, RoomDocument, ROOMS_COLLECTION};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion (Google's maximum).
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

/// Cached access tokens are replaced this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Project id used against an emulator when none is configured.
const EMULATOR_PROJECT: &str = "demo-handoff";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a Google service-account key file needed to mint tokens.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    pub project_id: Option<String>,
    pub client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl ServiceAccount {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::Config(format!("invalid service account key: {}", e)))
    }

    /// Loads a key given either inline JSON or a path to a key file.
    pub fn load(source: &str) -> Result<Self, StoreError> {
        if source.trim_start().starts_with('{') {
            return Self::from_json(source);
        }
        let contents = std::fs::read_to_string(source).map_err(|e| {
            StoreError::Config(format!("failed to read service account key {}: {}", source, e))
        })?;
        Self::from_json(&contents)
    }

    fn assertion(&self, issued_at: u64) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME.as_secs(),
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid private key: {}", e)))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StoreError::Auth(format!("failed to sign assertion: {}", e)))
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

enum Credentials {
    Emulator,
    ServiceAccount {
        account: ServiceAccount,
        cached: Mutex<Option<CachedToken>>,
    },
}

/// Firestore-backed [`RoomStore`].
pub struct FirestoreStore {
    http: Client,
    /// `.../databases/(default)/documents`, no trailing slash.
    documents_url: Url,
    credentials: Credentials,
}

impl fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.credentials {
            Credentials::Emulator => "emulator",
            Credentials::ServiceAccount { .. } => "service-account",
        };
        f.debug_struct("FirestoreStore")
            .field("documents_url", &self.documents_url.as_str())
            .field("credentials", &mode)
            .finish()
    }
}

impl FirestoreStore {
    /// Builds a client for Google's production endpoint.
    pub fn new(project_id: &str, account: ServiceAccount) -> Result<Self, StoreError> {
        Self::build(
            FIRESTORE_API,
            project_id,
            Credentials::ServiceAccount {
                account,
                cached: Mutex::new(None),
            },
        )
    }

    /// Builds an unauthenticated client for a Firestore emulator at `host`
    /// (`host:port`).
    pub fn emulator(host: &str, project_id: &str) -> Result<Self, StoreError> {
        let base = format!("http://{}/v1", host.trim_end_matches('/'));
        Self::build(&base, project_id, Credentials::Emulator)
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let account = config
            .firestore_credentials
            .as_deref()
            .map(ServiceAccount::load)
            .transpose()?;

        let project_id = config
            .firestore_project_id
            .clone()
            .or_else(|| account.as_ref().and_then(|a| a.project_id.clone()));

        if let Some(host) = config.firestore_emulator_host.as_deref() {
            let project_id = project_id.unwrap_or_else(|| EMULATOR_PROJECT.to_string());
            tracing::info!(host, project_id = %project_id, "using firestore emulator");
            return Self::emulator(host, &project_id);
        }

        let account = account.ok_or_else(|| {
            StoreError::Config(
                "firestore backend requires service account credentials (FIREBASE_SERVICE_ACCOUNT)"
                    .to_string(),
            )
        })?;
        let project_id = project_id.ok_or_else(|| {
            StoreError::Config("firestore backend requires a project id".to_string())
        })?;

        Self::new(&project_id, account)
    }

    fn build(api_base: &str, project_id: &str, credentials: Credentials) -> Result<Self, StoreError> {
        let documents_url = Url::parse(&format!(
            "{}/projects/{}/databases/(default)/documents",
            api_base, project_id
        ))
        .map_err(|e| StoreError::Config(format!("invalid firestore url: {}", e)))?;

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            documents_url,
            credentials,
        })
    }

    fn room_url(&self, room_name: &str) -> Result<Url, StoreError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Config("firestore url cannot be a base".to_string()))?
            .push(ROOMS_COLLECTION)
            .push(room_name);
        Ok(url)
    }

    async fn bearer_token(&self) -> Result<String, StoreError> {
        let (account, cached) = match &self.credentials {
            Credentials::Emulator => return Ok("owner".to_string()),
            Credentials::ServiceAccount { account, cached } => (account, cached),
        };

        let mut cached = cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StoreError::Auth(format!("system clock before epoch: {}", e)))?
            .as_secs();
        let assertion = account.assertion(issued_at)?;

        let response = self
            .http
            .post(&account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = token.expires_in, "refreshed firestore access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(token.access_token)
    }

    async fn patch(&self, url: Url, fields: &[(&str, &str)]) -> Result<(), StoreError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(token)
            .json(&encode_fields(fields))
            .send()
            .await?;
        check_status(response).await.map(drop)
    }
}

#[async_trait]
impl RoomStore for FirestoreStore {
    async fn set_room(&self, doc: &RoomDocument) -> Result<(), StoreError> {
        // PATCH without an update mask replaces the whole document and
        // creates it when missing.
        let url = self.room_url(&doc.room_name)?;
        self.patch(
            url,
            &[
                ("userId", doc.user_id.as_str()),
                ("roomName", doc.room_name.as_str()),
                ("request", doc.request.as_str()),
            ],
        )
        .await
    }

    async fn update_status(
        &self,
        room_name: &str,
        status: &RequestStatus,
    ) -> Result<(), StoreError> {
        let mut url = self.room_url(room_name)?;
        url.query_pairs_mut()
            .append_pair("updateMask.fieldPaths", "request")
            .append_pair("currentDocument.exists", "true");
        self.patch(url, &[("request", status.as_str())]).await
    }

    async fn get_room(&self, room_name: &str) -> Result<Option<RoomDocument>, StoreError> {
        let url = self.room_url(room_name)?;
        let token = self.bearer_token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: Value = check_status(response).await?.json().await?;
        decode_document(&body).map(Some)
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

/// Turns a non-2xx response into a `StoreError` carrying Firestore's message.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| format!("firestore returned {}", status));

    if status == StatusCode::NOT_FOUND {
        Err(StoreError::NotFound(message))
    } else {
        Err(StoreError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

/// Extracts `error.message` from a Google API error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn encode_fields(fields: &[(&str, &str)]) -> Value {
    let fields: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.to_string(), json!({ "stringValue": value })))
        .collect();
    json!({ "fields": fields })
}

fn decode_document(doc: &Value) -> Result<RoomDocument, StoreError> {
    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Malformed("document has no fields".to_string()))?;

    let string_field = |name: &str| {
        fields
            .get(name)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Malformed(format!("missing string field '{}'", name)))
    };

    Ok(RoomDocument {
        user_id: string_field("userId")?,
        room_name: string_field("roomName")?,
        request: RequestStatus::from(string_field("request")?),
    })
}
