use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::ledger::TrashEntry;
use crate::error::Result;
use crate::persist;

/// Current on-disk layout: one table per staged entry, oldest first.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    entries: Vec<TrashEntry>,
}

/// Layout written before entries carried timestamps: a bare id set.
#[derive(Debug, Serialize, Deserialize)]
struct LegacyLedgerFile {
    ids: Vec<String>,
}

/// Where a ledger lives on disk.
#[derive(Debug, Clone)]
pub struct LedgerFiles {
    pub path: PathBuf,
    pub legacy_path: PathBuf,
}

impl LedgerFiles {
    pub fn new(path: impl Into<PathBuf>, legacy_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            legacy_path: legacy_path.into(),
        }
    }

    /// Load entries, migrating the legacy file if one is present.
    ///
    /// Safe to repeat after a crash at any point of the migration: ids already in the
    /// current file are never added twice, and the legacy file is only removed once the
    /// merged result has been written.
    pub fn load(&self, now: DateTime<Utc>) -> Vec<TrashEntry> {
        let current = match read_current(&self.path) {
            Ok(current) => current,
            Err(e) => {
                warn!("Unreadable trash ledger {}: {}", self.path.display(), e);
                None
            }
        };
        let legacy = match read_legacy(&self.legacy_path) {
            Ok(legacy) => legacy,
            Err(e) => {
                warn!("Unreadable legacy trash {}: {}", self.legacy_path.display(), e);
                None
            }
        };

        let Some(legacy_ids) = legacy else {
            return dedup(current.unwrap_or_default());
        };

        let mut entries = dedup(current.unwrap_or_default());
        let mut seen: HashSet<String> = entries.iter().map(|e| e.id.clone()).collect();
        let before = entries.len();
        for id in legacy_ids {
            if seen.insert(id.clone()) {
                entries.push(TrashEntry { id, staged_at: now });
            }
        }
        info!(
            "Migrating legacy trash {}: {} entries added, {} total",
            self.legacy_path.display(),
            entries.len() - before,
            entries.len()
        );

        match self.try_save(&entries) {
            Ok(()) => {
                if let Err(e) = persist::remove_if_exists(&self.legacy_path) {
                    warn!("Failed to remove legacy trash {}: {}", self.legacy_path.display(), e);
                }
            }
            Err(e) => warn!("Failed to write migrated trash {}: {}", self.path.display(), e),
        }

        entries
    }

    /// Persist entries. Failures are logged and swallowed; the in-memory ledger stays
    /// authoritative for the session.
    pub fn save(&self, entries: &[TrashEntry]) {
        match self.try_save(entries) {
            Ok(()) => debug!("Saved {} trash entries", entries.len()),
            Err(e) => warn!("Failed to save trash ledger {}: {}", self.path.display(), e),
        }
    }

    fn try_save(&self, entries: &[TrashEntry]) -> Result<()> {
        let file = LedgerFile {
            entries: entries.to_vec(),
        };
        let text = toml::to_string(&file)?;
        persist::write_atomic(&self.path, text.as_bytes())?;
        Ok(())
    }
}

fn read_current(path: &Path) -> Result<Option<Vec<TrashEntry>>> {
    let Some(bytes) = persist::read_optional(path)? else {
        return Ok(None);
    };
    let file: LedgerFile = toml::from_str(&String::from_utf8_lossy(&bytes))?;
    Ok(Some(file.entries))
}

fn read_legacy(path: &Path) -> Result<Option<Vec<String>>> {
    let Some(bytes) = persist::read_optional(path)? else {
        return Ok(None);
    };
    let file: LegacyLedgerFile = toml::from_str(&String::from_utf8_lossy(&bytes))?;
    Ok(Some(file.ids))
}

fn dedup(entries: Vec<TrashEntry>) -> Vec<TrashEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect()
}

/// Write a ledger in the legacy layout. Only used to exercise migration.
#[cfg(test)]
pub(crate) fn write_legacy(path: &Path, ids: &[&str]) {
    let file = LegacyLedgerFile {
        ids: ids.iter().map(|id| id.to_string()).collect(),
    };
    std::fs::write(path, toml::to_string(&file).unwrap()).unwrap();
}
