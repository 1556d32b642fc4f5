//! Snapshot storage backends.
//!
//! - [`JsonFileStore`] — one pretty-printed JSON document per file, used for
//!   export and import
//! - [`SessionStore`] — named sessions in an embedded redb database, bincode
//!   encoded
//!
//! Both implement [`SnapshotStore`], which is all the engine sees.

pub mod durable;
pub mod json;

pub use durable::{Session, SessionStore};
pub use json::JsonFileStore;

use crate::error::PersistenceResult;
use crate::snapshot::Snapshot;

/// A place one snapshot can be saved to and loaded from.
pub trait SnapshotStore {
    fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()>;

    /// The stored snapshot, or `None` if nothing has been saved yet.
    fn load(&self) -> PersistenceResult<Option<Snapshot>>;
}
