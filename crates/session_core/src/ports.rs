//! crates/session_core/src/ports.rs
//!
//! Defines the service contracts (traits) the session controller depends on.
//! These traits form the boundary of the hexagonal architecture, so the state
//! machine can be driven without a network or durable storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Ack, Credentials, LoginGrant, PasswordChange, ProfileDraft, ProfilePatch, UserProfile,
};
use crate::snapshot::PersistedSession;

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// Failure reported by an `AuthGateway` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),
    #[error("Server fault (status {status})")]
    Server { status: u16 },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Request rejected (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reported by a `Persister` implementation.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The stored blob exists but cannot be understood.
    #[error("Corrupt session blob: {0}")]
    Corrupt(String),
    #[error("Storage I/O error: {0}")]
    Io(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Issues and validates credentials against the backend.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> GatewayResult<LoginGrant>;

    async fn register(&self, draft: &ProfileDraft) -> GatewayResult<Ack>;

    /// Online check of the currently attached credential.
    async fn verify_session(&self) -> GatewayResult<bool>;

    async fn fetch_profile(&self) -> GatewayResult<UserProfile>;

    async fn update_profile(&self, patch: &ProfilePatch) -> GatewayResult<Ack>;

    async fn change_password(&self, change: &PasswordChange) -> GatewayResult<Ack>;

    /// Drops any locally cached credential artifact. Makes no promise about
    /// the server side.
    async fn logout(&self) -> GatewayResult<()>;

    /// Makes a restored credential available for subsequent calls.
    /// Local only; implementations must not touch the network here.
    fn attach_credential(&self, credential: &str);
}

/// Durable storage for the persisted subset of the session.
///
/// Writes are synchronous and atomic: a `save` either fully lands or the
/// previous blob is read back.
pub trait Persister: Send + Sync {
    /// `Ok(None)` when nothing was ever stored.
    fn load(&self) -> PersistResult<Option<PersistedSession>>;

    fn save(&self, snapshot: &PersistedSession) -> PersistResult<()>;

    fn clear(&self) -> PersistResult<()>;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
