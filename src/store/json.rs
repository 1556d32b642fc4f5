//! Snapshot as a JSON file.

use std::path::{Path, PathBuf};

use crate::error::{PersistenceError, PersistenceResult};
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let json = snapshot.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }

    fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Snapshot::from_json(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
