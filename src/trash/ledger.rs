use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use super::persist::LedgerFiles;

/// One item staged for permanent deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntry {
    pub id: String,
    pub staged_at: DateTime<Utc>,
}

/// Ordered set of staged items with single-slot undo.
///
/// Entries keep insertion order (oldest first) so list positions stay stable; surfaces
/// that show newest first reverse at render time. Every mutation is persisted right away.
#[derive(Debug)]
pub struct TrashLedger {
    entries: Vec<TrashEntry>,
    staged: HashSet<String>,
    last_staged: Option<String>,
    files: Option<LedgerFiles>,
}

impl TrashLedger {
    /// Load (and migrate, if needed) the ledger stored at `files`.
    pub fn open(files: LedgerFiles) -> Self {
        let entries = files.load(Utc::now());
        debug!("Trash ledger opened with {} entries", entries.len());
        Self::from_entries(entries, Some(files))
    }

    /// A ledger that is never written to disk.
    pub fn in_memory() -> Self {
        Self::from_entries(Vec::new(), None)
    }

    fn from_entries(entries: Vec<TrashEntry>, files: Option<LedgerFiles>) -> Self {
        let staged = entries.iter().map(|e| e.id.clone()).collect();
        Self {
            entries,
            staged,
            last_staged: None,
            files,
        }
    }

    /// Stage `id`. Returns false (and changes nothing) if it is already staged.
    pub fn stage(&mut self, id: &str) -> bool {
        if self.staged.contains(id) {
            return false;
        }
        self.entries.push(TrashEntry {
            id: id.to_string(),
            staged_at: Utc::now(),
        });
        self.staged.insert(id.to_string());
        self.last_staged = Some(id.to_string());
        self.persist();
        true
    }

    pub fn restore(&mut self, id: &str) -> bool {
        self.remove_all([id]) == 1
    }

    pub fn restore_many<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove_all(ids)
    }

    /// Restore the most recently staged item, if the undo slot still points at one.
    pub fn undo_last(&mut self) -> Option<String> {
        let id = self.last_staged.clone()?;
        self.restore(&id);
        Some(id)
    }

    /// Drop ids whose permanent deletion was confirmed. Same mechanics as `restore_many`.
    pub fn mark_removed<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed = self.remove_all(ids);
        info!("Pruned {} deleted items from trash, {} remain", removed, self.count());
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.staged.clear();
        self.last_staged = None;
        self.persist();
    }

    pub fn is_staged(&self, id: &str) -> bool {
        self.staged.contains(id)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Staged ids, oldest first.
    pub fn all_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn ids_newest_first(&self) -> Vec<String> {
        self.entries.iter().rev().map(|e| e.id.clone()).collect()
    }

    pub fn entries(&self) -> &[TrashEntry] {
        &self.entries
    }

    /// Current undo target.
    pub fn last_staged(&self) -> Option<&str> {
        self.last_staged.as_deref()
    }

    fn remove_all<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets: HashSet<String> = ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .filter(|id| self.staged.contains(id))
            .collect();
        if targets.is_empty() {
            return 0;
        }

        self.entries.retain(|e| !targets.contains(&e.id));
        for id in &targets {
            self.staged.remove(id);
        }
        if self
            .last_staged
            .as_ref()
            .is_some_and(|last| targets.contains(last))
        {
            self.last_staged = None;
        }
        self.persist();
        targets.len()
    }

    fn persist(&self) {
        if let Some(files) = &self.files {
            files.save(&self.entries);
        }
    }
}
