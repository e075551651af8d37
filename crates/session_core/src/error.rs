//! crates/session_core/src/error.rs
//!
//! User-facing error taxonomy of the session controller.
//!
//! Gateway failures are classified exactly once, at the `SessionStore`
//! boundary, into an `AuthError` whose `Display` is the message shown to the user.

use crate::ports::{GatewayError, PersistError};

/// Minimum accepted password length, checked before any gateway call.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Local, pre-network rejection of user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please fill in all fields")]
    MissingFields,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("nothing to update")]
    EmptyPatch,
}

/// The single current error a user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    CredentialsRejected,
    #[error("your session is no longer valid, please sign in again")]
    SessionRejected,
    #[error("could not reach the server")]
    Unreachable,
    #[error("server error, try again later")]
    ServerFault,
    #[error("authentication failed")]
    MalformedResponse,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AuthError {
    /// Classifies a failure of the login call itself.
    pub fn for_login(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized => AuthError::CredentialsRejected,
            other => Self::classify(other),
        }
    }

    /// Classifies a failure of a call made on behalf of an existing session.
    /// A rejected credential surfaces as an error, never as a silent logout.
    pub fn for_session(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized => AuthError::SessionRejected,
            other => Self::classify(other),
        }
    }

    fn classify(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized => AuthError::CredentialsRejected,
            GatewayError::Unreachable(_) => AuthError::Unreachable,
            GatewayError::Server { .. } => AuthError::ServerFault,
            GatewayError::Malformed(_) => AuthError::MalformedResponse,
            GatewayError::Rejected { detail, .. } if !detail.trim().is_empty() => {
                AuthError::Rejected(detail)
            }
            GatewayError::Rejected { .. } => AuthError::MalformedResponse,
        }
    }
}

/// Outcome of a `SessionStore` operation that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("session is still being restored")]
    NotHydrated,
    #[error("already signed in")]
    AlreadyAuthenticated,
    #[error("a sign-in attempt is already in progress")]
    LoginInFlight,
    #[error("not signed in")]
    NotAuthenticated,
    /// A newer login or logout overtook this operation; its result was dropped.
    #[error("operation was superseded")]
    Superseded,
    #[error("session storage failed: {0}")]
    Storage(#[from] PersistError),
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Auth(AuthError::Validation(err))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
