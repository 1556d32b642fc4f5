//! Versioned snapshot of an engine's state.
//!
//! The same document is written as pretty JSON for export and as bincode for
//! the session database. Decoding rejects any version other than
//! [`SNAPSHOT_VERSION`].

use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, PersistenceResult};
use crate::state::EngineState;

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Milliseconds since the UNIX epoch, from the engine clock.
    pub created_at: u64,
    pub state: EngineState,
}

impl Snapshot {
    pub fn new(state: EngineState, created_at: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at,
            state,
        }
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::Serialization {
            message: format!("snapshot JSON encode failed: {e}"),
        })
    }

    pub fn from_json(text: &str) -> PersistenceResult<Self> {
        let snapshot: Self =
            serde_json::from_str(text).map_err(|e| PersistenceError::Serialization {
                message: format!("snapshot JSON decode failed: {e}"),
            })?;
        snapshot.check_version()
    }

    pub fn to_bytes(&self) -> PersistenceResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PersistenceError::Serialization {
            message: format!("snapshot encode failed: {e}"),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> PersistenceResult<Self> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| PersistenceError::Serialization {
                message: format!("snapshot decode failed: {e}"),
            })?;
        snapshot.check_version()
    }

    fn check_version(self) -> PersistenceResult<Self> {
        if self.version == SNAPSHOT_VERSION {
            Ok(self)
        } else {
            Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn snapshot() -> Snapshot {
        Snapshot::new(EngineState::new(&EngineConfig::default()), 42)
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut snap = snapshot();
        snap.version = SNAPSHOT_VERSION + 1;
        let json = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(PersistenceError::UnsupportedVersion { found: 2, expected: 1 })
        ));

        let bytes = bincode::serialize(&snap).unwrap();
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(PersistenceError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        assert!(matches!(
            Snapshot::from_json("{ not json"),
            Err(PersistenceError::Serialization { .. })
        ));
        assert!(matches!(
            Snapshot::from_bytes(&[0xff, 0x01]),
            Err(PersistenceError::Serialization { .. })
        ));
    }

    #[test]
    fn fresh_state_survives_both_encodings() {
        let snap = snapshot();
        assert_eq!(Snapshot::from_json(&snap.to_json().unwrap()).unwrap(), snap);
        assert_eq!(Snapshot::from_bytes(&snap.to_bytes().unwrap()).unwrap(), snap);
    }
}
