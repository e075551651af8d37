//! crates/session_core/src/redirect.rs
//!
//! Single-slot memory of the path a user was blocked from.
//! Lives as long as the client process; never persisted.

use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct RedirectMemory {
    slot: Mutex<Option<String>>,
}

impl RedirectMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites whatever was remembered before.
    pub fn remember(&self, path: impl Into<String>) {
        *self.slot.lock() = Some(path.into());
    }

    /// Reads and clears the slot.
    pub fn take(&self) -> Option<String> {
        self.slot.lock().take()
    }

    pub fn peek(&self) -> Option<String> {
        self.slot.lock().clone()
    }

    pub fn clear(&self) {
        self.slot.lock().take();
    }
}
