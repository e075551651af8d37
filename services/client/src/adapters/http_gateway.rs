//! services/client/src/adapters/http_gateway.rs
//!
//! This module contains the HTTP adapter for the login API. It implements the
//! `AuthGateway` port from the `session_core` crate on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use session_core::{
    Ack, AuthGateway, Credentials, GatewayError, GatewayResult, LoginGrant, PasswordChange,
    ProfileDraft, ProfilePatch, Role, UserProfile,
};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// Endpoints
//=========================================================================================

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const VERIFY_PATH: &str = "/api/auth/verify";
pub const PROFILE_PATH: &str = "/api/v1/users/me";
pub const CHANGE_PASSWORD_PATH: &str = "/api/v1/users/me/change-password";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An HTTP adapter that implements the `AuthGateway` port.
pub struct HttpAuthGateway {
    client: Client,
    base_url: String,
    /// Bearer credential sent with every request once attached.
    credential: RwLock<Option<String>>,
}

impl HttpAuthGateway {
    /// Creates a new `HttpAuthGateway` talking to `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential: RwLock::new(None),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.credential.read().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credential.read().as_deref() {
            Some(credential) => request.bearer_auth(credential),
            None => request,
        }
    }

    /// Sends a request carrying the attached credential.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        dispatch(self.authorize(request)).await
    }
}

/// Sends a request and decodes a successful JSON body.
async fn dispatch<T: DeserializeOwned>(request: RequestBuilder) -> GatewayResult<T> {
    let response = request.send().await.map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Login API returned an error status");
        return Err(status_error(status.as_u16(), &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::Malformed(e.to_string()))
}

//=========================================================================================
// Status classification
//=========================================================================================

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Malformed(err.to_string())
    } else {
        GatewayError::Unreachable(err.to_string())
    }
}

/// Maps a non-success status and its body onto the port's error type.
pub(crate) fn status_error(status: u16, body: &str) -> GatewayError {
    match status {
        401 => GatewayError::Unauthorized,
        500..=599 => GatewayError::Server { status },
        _ => GatewayError::Rejected {
            status,
            detail: extract_detail(body).unwrap_or_else(|| format!("Error {status}")),
        },
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pulls the human-readable message out of a `{"detail": ...}` body. Validation
/// failures carry a list of `{"msg": ...}` entries; the first one is used.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .map(str::to_string),
        _ => None,
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
pub(crate) struct UserRecord {
    id: Uuid,
    email: String,
    #[serde(default)]
    nombre: String,
    #[serde(default)]
    apellido: String,
    #[serde(default)]
    rol: String,
    #[serde(default = "default_active")]
    activo: bool,
    #[serde(default)]
    fecha_creacion: String,
}

fn default_active() -> bool {
    true
}

impl UserRecord {
    pub(crate) fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            first_name: self.nombre,
            last_name: self.apellido,
            role: if self.rol.eq_ignore_ascii_case("admin") {
                Role::Admin
            } else {
                Role::User
            },
            active: self.activo,
            created_at: self.fecha_creacion,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct LoginRecord {
    access_token: Option<String>,
    user: Option<UserRecord>,
}

impl LoginRecord {
    pub(crate) fn to_domain(self) -> LoginGrant {
        LoginGrant {
            credential: self.access_token,
            user: self.user.map(UserRecord::to_domain),
        }
    }
}

#[derive(Deserialize, Default)]
struct AckRecord {
    #[serde(default)]
    message: String,
    #[serde(default)]
    success: bool,
}

impl AckRecord {
    fn to_domain(self) -> Ack {
        Ack {
            message: self.message,
            success: self.success,
        }
    }
}

#[derive(Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterPayload<'a> {
    email: &'a str,
    password: &'a str,
    nombre: &'a str,
    apellido: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rol: Option<&'static str>,
}

#[derive(Serialize)]
struct UpdatePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    nombre: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apellido: Option<&'a str>,
}

#[derive(Serialize)]
struct ChangePasswordPayload<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

//=========================================================================================
// `AuthGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, credentials: &Credentials) -> GatewayResult<LoginGrant> {
        let payload = LoginPayload {
            email: &credentials.email,
            password: &credentials.password,
        };
        // The login call never carries a previous credential.
        let record: LoginRecord =
            dispatch(self.client.post(self.url(LOGIN_PATH)).json(&payload)).await?;
        Ok(record.to_domain())
    }

    async fn register(&self, draft: &ProfileDraft) -> GatewayResult<Ack> {
        let payload = RegisterPayload {
            email: &draft.email,
            password: &draft.password,
            nombre: &draft.first_name,
            apellido: &draft.last_name,
            rol: draft.role.map(|role| match role {
                Role::Admin => "admin",
                Role::User => "user",
            }),
        };
        let record: AckRecord = self
            .send(self.client.post(self.url(REGISTER_PATH)).json(&payload))
            .await?;
        Ok(record.to_domain())
    }

    async fn verify_session(&self) -> GatewayResult<bool> {
        if !self.has_credential() {
            return Ok(false);
        }
        match self
            .send::<AckRecord>(self.client.get(self.url(VERIFY_PATH)))
            .await
        {
            Ok(_) => Ok(true),
            Err(GatewayError::Unauthorized) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn fetch_profile(&self) -> GatewayResult<UserProfile> {
        let record: UserRecord = self.send(self.client.get(self.url(PROFILE_PATH))).await?;
        Ok(record.to_domain())
    }

    async fn update_profile(&self, patch: &ProfilePatch) -> GatewayResult<Ack> {
        let payload = UpdatePayload {
            nombre: patch.first_name.as_deref(),
            apellido: patch.last_name.as_deref(),
        };
        let record: AckRecord = self
            .send(self.client.put(self.url(PROFILE_PATH)).json(&payload))
            .await?;
        Ok(record.to_domain())
    }

    async fn change_password(&self, change: &PasswordChange) -> GatewayResult<Ack> {
        let payload = ChangePasswordPayload {
            current_password: &change.current_password,
            new_password: &change.new_password,
        };
        let record: AckRecord = self
            .send(self.client.post(self.url(CHANGE_PASSWORD_PATH)).json(&payload))
            .await?;
        Ok(record.to_domain())
    }

    async fn logout(&self) -> GatewayResult<()> {
        self.credential.write().take();
        Ok(())
    }

    fn attach_credential(&self, credential: &str) {
        *self.credential.write() = Some(credential.to_string());
    }
}
