//! services/client/src/adapters/file_persister.rs
//!
//! Durable storage of the persisted session as a single JSON file.
//! Implements the `Persister` port from the `session_core` crate.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use session_core::{PersistError, PersistResult, PersistedSession, Persister};

/// Stores the session blob at one path. Writes go to a sibling temp file
/// that is renamed over the target, so a reader never sees a torn blob.
#[derive(Debug, Clone)]
pub struct FilePersister {
    path: PathBuf,
}

impl FilePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(err: std::io::Error) -> PersistError {
    PersistError::Io(err.to_string())
}

impl Persister for FilePersister {
    fn load(&self) -> PersistResult<Option<PersistedSession>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => PersistedSession::from_json(&blob).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                Err(PersistError::Corrupt(err.to_string()))
            }
            Err(err) => Err(io_error(err)),
        }
    }

    fn save(&self, snapshot: &PersistedSession) -> PersistResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let encoded = snapshot.to_json()?;
        let temp = self.temp_path();
        fs::write(&temp, encoded).map_err(io_error)?;
        fs::rename(&temp, &self.path).map_err(io_error)
    }

    fn clear(&self) -> PersistResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}
