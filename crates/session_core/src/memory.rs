//! crates/session_core/src/memory.rs
//!
//! An in-process `Persister` holding the encoded blob, for embedding and tests.

use parking_lot::Mutex;

use crate::ports::{PersistResult, Persister};
use crate::snapshot::PersistedSession;

#[derive(Debug, Default)]
pub struct MemoryPersister {
    blob: Mutex<Option<String>>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the slot with an arbitrary, possibly unparsable, blob.
    pub fn with_raw(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    pub fn with_snapshot(snapshot: &PersistedSession) -> PersistResult<Self> {
        Ok(Self::with_raw(snapshot.to_json()?))
    }

    pub fn raw(&self) -> Option<String> {
        self.blob.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.lock().is_none()
    }
}

impl Persister for MemoryPersister {
    fn load(&self) -> PersistResult<Option<PersistedSession>> {
        match self.blob.lock().as_deref() {
            None => Ok(None),
            Some(blob) => PersistedSession::from_json(blob).map(Some),
        }
    }

    fn save(&self, snapshot: &PersistedSession) -> PersistResult<()> {
        let encoded = snapshot.to_json()?;
        *self.blob.lock() = Some(encoded);
        Ok(())
    }

    fn clear(&self) -> PersistResult<()> {
        *self.blob.lock() = None;
        Ok(())
    }
}
