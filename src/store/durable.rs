//! Named sessions in an ACID-durable redb database.
//!
//! Each session is one bincode-encoded [`Snapshot`] keyed by its name. All
//! writes go through transactions; reads use MVCC snapshots.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::{PersistenceError, PersistenceResult};
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

/// Session name → encoded snapshot.
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

fn db_error<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> PersistenceError {
    move |e| PersistenceError::Database {
        message: format!("{context} failed: {e}"),
    }
}

/// Session database backed by redb.
#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Database>,
}

impl SessionStore {
    /// Open or create the database file, creating parent directories.
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let db = Database::create(path).map_err(|e| PersistenceError::Database {
            message: format!("failed to open redb at {}: {e}", path.display()),
        })?;

        // Create the table up front so read transactions never see it missing.
        let txn = db.begin_write().map_err(db_error("begin_write"))?;
        txn.open_table(SESSIONS_TABLE)
            .map_err(db_error("open_table"))?;
        txn.commit().map_err(db_error("commit"))?;

        tracing::info!(path = %path.display(), "opened session store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Store a snapshot under `name`, replacing any previous one.
    pub fn save(&self, name: &str, snapshot: &Snapshot) -> PersistenceResult<()> {
        let bytes = snapshot.to_bytes()?;
        let txn = self
            .db
            .begin_write()
            .map_err(db_error("begin_write"))?;
        {
            let mut table = txn
                .open_table(SESSIONS_TABLE)
                .map_err(db_error("open_table"))?;
            table
                .insert(name, bytes.as_slice())
                .map_err(db_error("insert"))?;
        }
        txn.commit().map_err(db_error("commit"))?;
        tracing::debug!(session = name, bytes = bytes.len(), "saved session");
        Ok(())
    }

    /// The snapshot stored under `name`, if any.
    pub fn load(&self, name: &str) -> PersistenceResult<Option<Snapshot>> {
        let txn = self
            .db
            .begin_read()
            .map_err(db_error("begin_read"))?;
        let table = txn
            .open_table(SESSIONS_TABLE)
            .map_err(db_error("open_table"))?;
        let guard = table.get(name).map_err(db_error("get"))?;
        guard.map(|g| Snapshot::from_bytes(g.value())).transpose()
    }

    /// Delete a session. Returns whether it existed.
    pub fn remove(&self, name: &str) -> PersistenceResult<bool> {
        let txn = self
            .db
            .begin_write()
            .map_err(db_error("begin_write"))?;
        let existed = {
            let mut table = txn
                .open_table(SESSIONS_TABLE)
                .map_err(db_error("open_table"))?;
            let removed = table.remove(name).map_err(db_error("remove"))?;
            removed.is_some()
        };
        txn.commit().map_err(db_error("commit"))?;
        Ok(existed)
    }

    /// Names of all stored sessions, sorted.
    pub fn list_sessions(&self) -> PersistenceResult<Vec<String>> {
        let txn = self
            .db
            .begin_read()
            .map_err(db_error("begin_read"))?;
        let table = txn
            .open_table(SESSIONS_TABLE)
            .map_err(db_error("open_table"))?;
        let mut names = Vec::new();
        for item in table.iter().map_err(db_error("iter"))? {
            let (key, _) = item.map_err(db_error("iter"))?;
            names.push(key.value().to_owned());
        }
        Ok(names)
    }

    /// A handle to one named session.
    pub fn session(&self, name: impl Into<String>) -> Session<'_> {
        Session {
            store: self,
            name: name.into(),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish()
    }
}

/// One named session inside a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct Session<'a> {
    store: &'a SessionStore,
    name: String,
}

impl Session<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SnapshotStore for Session<'_> {
    fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        self.store.save(&self.name, snapshot)
    }

    fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        self.store.load(&self.name)
    }
}
