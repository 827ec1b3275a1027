use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::outcome::{DeletionError, DeletionOutcome};
use crate::media::MediaStore;

/// Sends one bulk permanent-deletion request and reports exactly which ids are gone.
///
/// Touches no local state: pruning the trash and recording stats is up to the caller.
pub struct DeletionExecutor<'a, S: MediaStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MediaStore + ?Sized> DeletionExecutor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn delete(&self, ids: &[String]) -> DeletionOutcome {
        if ids.is_empty() {
            debug!("Deletion requested with no ids");
            return DeletionOutcome::nothing_to_delete();
        }

        let mut seen = HashSet::new();
        let requested: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let handles = match self.store.resolve(&requested) {
            Ok(handles) => handles,
            Err(e) => {
                warn!("Could not resolve {} items for deletion: {}", requested.len(), e);
                return DeletionOutcome::failed(requested, e.into());
            }
        };

        // Ids that no longer resolve were removed elsewhere; they count as confirmed.
        let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let handles: Vec<_> = handles
            .into_iter()
            .filter(|h| requested_set.contains(h.id.as_str()))
            .collect();
        let already_gone = requested.len().saturating_sub(handles.len());
        if already_gone > 0 {
            debug!("{} requested items no longer exist in the store", already_gone);
        }
        if handles.is_empty() {
            info!("All {} requested items were already gone", requested.len());
            return DeletionOutcome::removed(requested.len(), Vec::new());
        }

        match self.store.bulk_delete(&handles) {
            Ok(report) => {
                let failed: HashSet<&str> = report.failed.iter().map(String::as_str).collect();
                let unconfirmed: Vec<String> = requested
                    .iter()
                    .filter(|id| failed.contains(id.as_str()))
                    .cloned()
                    .collect();

                if unconfirmed.len() == requested.len() {
                    warn!("Store accepted the request but removed none of {} items", requested.len());
                    return DeletionOutcome::failed(
                        requested,
                        DeletionError::Other("no requested items could be removed".to_string()),
                    );
                }

                info!(
                    "Deleted {} of {} items ({} already gone, {} failed)",
                    requested.len() - unconfirmed.len(),
                    requested.len(),
                    already_gone,
                    unconfirmed.len()
                );
                DeletionOutcome::removed(requested.len(), unconfirmed)
            }
            Err(e) => {
                warn!("Bulk delete of {} items failed: {}", handles.len(), e);
                DeletionOutcome::failed(requested, e.into())
            }
        }
    }
}
