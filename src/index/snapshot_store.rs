use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::model::{IndexSnapshot, IndexedItem, SCHEMA_VERSION};
use crate::error::Result;
use crate::persist;

/// On-disk layout. `schema_version` must stay the first field: it is decoded on its own
/// before the rest of the record is trusted.
#[derive(Serialize, Deserialize)]
struct StoredSnapshot {
    schema_version: u32,
    indexed_at: DateTime<Utc>,
    items: Vec<IndexedItem>,
}

/// Single persistence slot for the index snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last saved snapshot, or `None` if the file is missing, unreadable, or from another
    /// schema version. Callers treat `None` exactly like a first run.
    pub fn load(&self) -> Option<IndexSnapshot> {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Discarding snapshot {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Persist atomically. Failures are logged and swallowed; losing the cache only makes
    /// the next launch slower.
    pub fn save(&self, snapshot: &IndexSnapshot) {
        match self.try_save(snapshot) {
            Ok(bytes) => debug!(
                "Saved snapshot of {} items ({} bytes) to {}",
                snapshot.len(),
                bytes,
                self.path.display()
            ),
            Err(e) => warn!("Failed to save snapshot to {}: {}", self.path.display(), e),
        }
    }

    pub fn clear(&self) {
        match persist::remove_if_exists(&self.path) {
            Ok(()) => info!("Snapshot cache cleared"),
            Err(e) => warn!("Failed to clear snapshot {}: {}", self.path.display(), e),
        }
    }

    fn try_load(&self) -> Result<Option<IndexSnapshot>> {
        let Some(bytes) = persist::read_optional(&self.path)? else {
            debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        };

        let version: u32 = bincode::deserialize(&bytes)?;
        if version != SCHEMA_VERSION {
            info!(
                "Snapshot schema version {} does not match {}, ignoring it",
                version, SCHEMA_VERSION
            );
            return Ok(None);
        }

        let stored: StoredSnapshot = bincode::deserialize(&bytes)?;
        let snapshot =
            IndexSnapshot::with_version(stored.schema_version, stored.indexed_at, stored.items);
        debug!(
            "Loaded snapshot of {} items indexed at {}",
            snapshot.len(),
            snapshot.indexed_at()
        );
        Ok(Some(snapshot))
    }

    fn try_save(&self, snapshot: &IndexSnapshot) -> Result<usize> {
        let stored = StoredSnapshot {
            schema_version: snapshot.schema_version(),
            indexed_at: snapshot.indexed_at(),
            items: snapshot.items().cloned().collect(),
        };
        let bytes = bincode::serialize(&stored)?;
        persist::write_atomic(&self.path, &bytes)?;
        Ok(bytes.len())
    }
}
