//! crates/session_core/src/navigator.rs
//!
//! Tracks the current location and applies gate decisions to it until the
//! location is stable.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::SessionState;
use crate::gate::{GateAction, SessionGate};

/// Redirect chains are at most two hops (protected -> login -> target).
const MAX_HOPS: usize = 4;

pub struct Navigator {
    gate: SessionGate,
    current: Mutex<String>,
}

impl Navigator {
    pub fn new(gate: SessionGate, start: impl Into<String>) -> Self {
        Self {
            gate,
            current: Mutex::new(start.into()),
        }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn current(&self) -> String {
        self.current.lock().clone()
    }

    /// Moves to `path`, then lets the gate redirect as needed.
    pub fn visit(&self, state: &SessionState, path: &str) -> String {
        let mut current = self.current.lock();
        *current = path.to_string();
        self.settle_locked(&mut current, state)
    }

    /// Re-evaluates the current location against `state`.
    pub fn settle(&self, state: &SessionState) -> String {
        let mut current = self.current.lock();
        self.settle_locked(&mut current, state)
    }

    fn settle_locked(&self, current: &mut String, state: &SessionState) -> String {
        for _ in 0..MAX_HOPS {
            let next = match self.gate.evaluate(state, current.as_str()) {
                GateAction::Stay => return current.clone(),
                GateAction::RememberAndRedirectToLogin { login } => login,
                GateAction::ConsumeRedirect { target } => target,
            };
            info!(from = %current, to = %next, "Redirecting");
            *current = next;
        }
        debug!(path = %current, "Redirect limit reached");
        current.clone()
    }

    /// Re-settles on every published state change until the store goes away.
    pub async fn follow(self: Arc<Self>, mut updates: watch::Receiver<SessionState>) {
        loop {
            let state = updates.borrow_and_update().clone();
            self.settle(&state);
            if updates.changed().await.is_err() {
                debug!("Session store dropped, navigator stops following");
                return;
            }
        }
    }
}
