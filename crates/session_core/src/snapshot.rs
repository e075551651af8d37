//! crates/session_core/src/snapshot.rs
//!
//! The persisted subset of the session and its JSON encoding.

use serde::{Deserialize, Serialize};

use crate::domain::{SessionState, TokenRecord, UserProfile};
use crate::ports::{PersistError, PersistResult};

/// Bumped whenever the layout of `PersistedSession` changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Only `user`, `token` and `is_authenticated` survive a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u32,
    pub user: Option<UserProfile>,
    pub token: Option<TokenRecord>,
    pub is_authenticated: bool,
}

impl PersistedSession {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            version: SCHEMA_VERSION,
            user: state.user.clone(),
            token: state.token.clone(),
            is_authenticated: state.is_authenticated,
        }
    }

    pub fn to_json(&self) -> PersistResult<String> {
        serde_json::to_string(self).map_err(|e| PersistError::Io(e.to_string()))
    }

    /// Decodes a stored blob. Unknown schema versions count as corrupt.
    pub fn from_json(blob: &str) -> PersistResult<Self> {
        let snapshot: Self =
            serde_json::from_str(blob).map_err(|e| PersistError::Corrupt(e.to_string()))?;
        if snapshot.version != SCHEMA_VERSION {
            return Err(PersistError::Corrupt(format!(
                "unsupported schema version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    /// The user and token of a blob that claims an authenticated session.
    pub fn into_session(self) -> Option<(UserProfile, TokenRecord)> {
        match (self.is_authenticated, self.user, self.token) {
            (true, Some(user), Some(token)) => Some((user, token)),
            _ => None,
        }
    }
}
