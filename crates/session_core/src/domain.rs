//! crates/session_core/src/domain.rs
//!
//! Defines the core data structures of the session controller.
//! Field names here are the client's own; wire formats live in the adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

//=========================================================================================
// Identity
//=========================================================================================

/// The role granted to a user by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The identity record of the signed-in user. Always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
    /// Creation timestamp as reported by the backend.
    pub created_at: String,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// An issued credential and the local instant after which it is considered stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub credential: String,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Gateway payloads
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// What the gateway answered to a login. Either field may be missing in a
/// malformed answer; the store decides whether the grant is usable.
#[derive(Debug, Clone, Default)]
pub struct LoginGrant {
    pub credential: Option<String>,
    pub user: Option<UserProfile>,
}

/// A validated registration payload.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A validated password change request.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// A generic acknowledgement returned by mutating gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ack {
    pub message: String,
    pub success: bool,
}

//=========================================================================================
// Session state
//=========================================================================================

/// Where the store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Hydrating,
    Authenticated,
    Unauthenticated,
}

/// The in-process session state observed by the rest of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub token: Option<TokenRecord>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub is_hydrated: bool,
    pub error: Option<AuthError>,
}

impl SessionState {
    /// The shape every process starts in: nothing known, waiting for hydration.
    pub fn initial() -> Self {
        Self {
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: true,
            is_hydrated: false,
            error: None,
        }
    }

    /// Resets to the unauthenticated baseline. Hydration status is kept.
    pub(crate) fn reset(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
        self.is_loading = false;
        self.error = None;
    }

    pub fn credential(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.credential.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserProfile::is_admin)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
