//! Caller-facing surface: one owning context for the library, trash and deletion state.
//!
//! All mutable state lives here and is touched only by the owner. The index walk runs on a
//! worker thread and streams progress back over a channel; at most one walk is in flight.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::aggregate::{self, YearBucket};
use crate::config::AppConfig;
use crate::deletion::{DeletionExecutor, DeletionOutcome};
use crate::error::{Error, Result};
use crate::index::{
    CancelToken, IndexRun, IndexSnapshot, IndexSummary, Indexer, IndexerSettings, SnapshotStore,
};
use crate::media::{MediaStore, MediaStoreError};
use crate::progress::{ChannelReporter, IndexProgress, ProgressReporter};
use crate::stats::{self, LifetimeStats, StatsAccumulator};
use crate::trash::{LedgerFiles, TrashLedger};

/// Returned by [`PhotoLibraryFacade::refresh`]: what can be shown right away, plus the
/// progress of the run that just started.
pub struct Refresh {
    /// Buckets of the snapshot already in memory (empty on a first run).
    pub buckets: Vec<YearBucket>,
    pub progress: Receiver<IndexProgress>,
}

/// Returned by [`PhotoLibraryFacade::finish_refresh`].
#[derive(Debug)]
pub struct Refreshed {
    pub buckets: Vec<YearBucket>,
    /// False when the run was cancelled and the previous snapshot was kept.
    pub completed: bool,
    pub summary: Option<IndexSummary>,
}

struct IndexTask {
    handle: JoinHandle<std::result::Result<IndexRun, MediaStoreError>>,
    cancel: CancelToken,
}

pub struct PhotoLibraryFacade<S: MediaStore + 'static> {
    store: Arc<S>,
    snapshots: SnapshotStore,
    settings: IndexerSettings,
    current: Option<Arc<IndexSnapshot>>,
    in_flight: Option<IndexTask>,
    /// Ids deleted while a run was in flight; that run enumerated them before they went.
    removed_during_run: HashSet<String>,
}

impl<S: MediaStore + 'static> PhotoLibraryFacade<S> {
    /// Starts from whatever snapshot the store holds; no enumeration happens until `refresh`.
    pub fn new(store: Arc<S>, snapshots: SnapshotStore, settings: IndexerSettings) -> Self {
        let current = snapshots.load().map(Arc::new);
        info!(
            "Library opened with {} cached items",
            current.as_ref().map(|s| s.len()).unwrap_or(0)
        );
        Self {
            store,
            snapshots,
            settings,
            current,
            in_flight: None,
            removed_during_run: HashSet::new(),
        }
    }

    pub fn snapshot(&self) -> Option<&IndexSnapshot> {
        self.current.as_deref()
    }

    pub fn buckets(&self) -> Vec<YearBucket> {
        self.current
            .as_deref()
            .map(aggregate::bucket)
            .unwrap_or_default()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a reindex on a worker thread.
    ///
    /// If a run is already in flight it is awaited (and its result applied) first, so two
    /// walks never overlap.
    pub fn refresh(&mut self) -> Refresh {
        if self.in_flight.is_some() {
            debug!("Refresh requested while indexing, waiting for the current run");
            if let Err(e) = self.finish_refresh() {
                warn!("Previous index run failed: {}", e);
            }
        }

        self.removed_during_run.clear();
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let store = Arc::clone(&self.store);
        let previous = self.current.clone();
        let settings = self.settings;
        let worker_cancel = cancel.clone();

        let handle = thread::spawn(move || {
            let enumeration = match store.enumerate() {
                Ok(items) => items,
                Err(e) => {
                    let _ = tx.send(IndexProgress::Finished { complete: false });
                    return Err(e);
                }
            };
            let reporter = ChannelReporter::new(tx);
            let indexer = Indexer::new(&*store, settings);
            Ok(indexer.reindex(previous.as_deref(), &enumeration, &reporter, &worker_cancel))
        });

        self.in_flight = Some(IndexTask { handle, cancel });
        Refresh {
            buckets: self.buckets(),
            progress: rx,
        }
    }

    /// Ask the in-flight run to stop. Its partial result will be discarded.
    pub fn cancel_refresh(&self) {
        if let Some(task) = &self.in_flight {
            task.cancel.cancel();
        }
    }

    /// Wait for the in-flight run and apply it. Only a completed run replaces (and
    /// persists) the snapshot. With nothing in flight this just reports current buckets.
    pub fn finish_refresh(&mut self) -> Result<Refreshed> {
        let Some(task) = self.in_flight.take() else {
            return Ok(Refreshed {
                buckets: self.buckets(),
                completed: false,
                summary: None,
            });
        };

        let removed_during_run = std::mem::take(&mut self.removed_during_run);
        let run = task.handle.join().map_err(|_| Error::WorkerPanicked)??;
        match run {
            IndexRun::Complete { snapshot, summary } => {
                let snapshot = without_ids(&snapshot, &removed_during_run).unwrap_or(snapshot);
                self.snapshots.save(&snapshot);
                self.current = Some(Arc::new(snapshot));
                Ok(Refreshed {
                    buckets: self.buckets(),
                    completed: true,
                    summary: Some(summary),
                })
            }
            IndexRun::Cancelled {
                processed, total, ..
            } => {
                info!(
                    "Discarding cancelled index run ({} of {} items)",
                    processed, total
                );
                Ok(Refreshed {
                    buckets: self.buckets(),
                    completed: false,
                    summary: None,
                })
            }
        }
    }

    /// Drop ids confirmed deleted from the in-memory snapshot (as a new snapshot) so buckets
    /// reflect the deletion before the next reindex.
    ///
    /// Ids forgotten while a run is in flight are also dropped from that run's result.
    pub fn forget(&mut self, removed: &[String]) {
        let removed: HashSet<String> = removed.iter().cloned().collect();
        if self.in_flight.is_some() {
            self.removed_during_run.extend(removed.iter().cloned());
        }

        let Some(next) = self
            .current
            .as_deref()
            .and_then(|current| without_ids(current, &removed))
        else {
            return;
        };
        self.snapshots.save(&next);
        self.current = Some(Arc::new(next));
    }

    /// Forget the persisted and in-memory snapshot; the next refresh derives everything.
    pub fn clear_cache(&mut self) {
        self.snapshots.clear();
        self.current = None;
    }
}

/// A new snapshot without `removed`, or `None` when none of them are present.
fn without_ids(snapshot: &IndexSnapshot, removed: &HashSet<String>) -> Option<IndexSnapshot> {
    if removed.is_empty() || !removed.iter().any(|id| snapshot.get(id).is_some()) {
        return None;
    }
    let kept: Vec<_> = snapshot
        .items()
        .filter(|item| !removed.contains(&item.id))
        .cloned()
        .collect();
    debug!("Dropping {} deleted items from the snapshot", snapshot.len() - kept.len());
    Some(IndexSnapshot::new(snapshot.indexed_at(), kept))
}

impl<S: MediaStore + 'static> Drop for PhotoLibraryFacade<S> {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.cancel.cancel();
            let _ = task.handle.join();
        }
    }
}

/// Staging surface over the trash ledger.
#[derive(Debug)]
pub struct TrashFacade {
    ledger: TrashLedger,
}

impl TrashFacade {
    pub fn new(ledger: TrashLedger) -> Self {
        Self { ledger }
    }

    pub fn stage(&mut self, id: &str) -> bool {
        self.ledger.stage(id)
    }

    pub fn restore(&mut self, id: &str) -> bool {
        self.ledger.restore(id)
    }

    pub fn restore_many<I, T>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.ledger.restore_many(ids)
    }

    pub fn undo_last(&mut self) -> Option<String> {
        self.ledger.undo_last()
    }

    /// Staged ids, oldest first.
    pub fn ordered_ids(&self) -> Vec<String> {
        self.ledger.all_ids()
    }

    pub fn count(&self) -> usize {
        self.ledger.count()
    }

    pub fn is_staged(&self, id: &str) -> bool {
        self.ledger.is_staged(id)
    }

    pub fn clear(&mut self) {
        self.ledger.clear();
    }

    pub fn ledger(&self) -> &TrashLedger {
        &self.ledger
    }

    fn mark_removed<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) -> usize {
        self.ledger.mark_removed(ids)
    }
}

/// Confirmed permanent deletion: runs the executor, prunes the trash and records stats.
pub struct DeletionFacade<S: MediaStore + 'static> {
    store: Arc<S>,
    stats: StatsAccumulator,
}

impl<S: MediaStore + 'static> DeletionFacade<S> {
    pub fn new(store: Arc<S>, stats: StatsAccumulator) -> Self {
        Self { store, stats }
    }

    pub fn stats(&self) -> LifetimeStats {
        self.stats.totals()
    }

    /// Permanently delete everything staged. An empty trash leaves all state untouched.
    pub fn empty_trash(
        &mut self,
        trash: &mut TrashFacade,
        snapshot: Option<&IndexSnapshot>,
        reporter: &dyn ProgressReporter,
    ) -> DeletionOutcome {
        let ids = trash.ordered_ids();
        self.delete_staged(trash, &ids, snapshot, reporter)
    }

    /// Permanently delete `ids`. Blocks on the store's single bulk request, so hosts call it
    /// from a worker.
    pub fn delete_staged(
        &mut self,
        trash: &mut TrashFacade,
        ids: &[String],
        snapshot: Option<&IndexSnapshot>,
        reporter: &dyn ProgressReporter,
    ) -> DeletionOutcome {
        if ids.is_empty() {
            return DeletionOutcome::nothing_to_delete();
        }

        reporter.on_delete_start(ids.len());
        let outcome = DeletionExecutor::new(&*self.store).delete(ids);
        reporter.on_delete_complete(outcome.confirmed(), outcome.unconfirmed().len());

        if outcome.confirmed() > 0 {
            trash.mark_removed(outcome.confirmed_ids(ids));
            let mut seen = HashSet::new();
            let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(*id)).collect();
            let requested_bytes = snapshot.map(|s| s.total_bytes_of(&unique)).unwrap_or(0);
            let reclaimed =
                stats::proportional_bytes(requested_bytes, outcome.confirmed(), outcome.requested());
            self.stats.record(outcome.confirmed() as u64, reclaimed);
        }

        outcome
    }
}

/// Everything a host needs, built from one config and one media store.
pub struct MediaSweep<S: MediaStore + 'static> {
    pub library: PhotoLibraryFacade<S>,
    pub trash: TrashFacade,
    pub deletion: DeletionFacade<S>,
}

impl<S: MediaStore + 'static> MediaSweep<S> {
    pub fn open(config: &AppConfig, store: Arc<S>) -> Self {
        let library = PhotoLibraryFacade::new(
            Arc::clone(&store),
            SnapshotStore::new(config.snapshot_path()),
            IndexerSettings::from_config(config),
        );
        let trash = TrashFacade::new(TrashLedger::open(LedgerFiles::new(
            config.trash_path(),
            config.legacy_trash_path(),
        )));
        let deletion = DeletionFacade::new(store, StatsAccumulator::open(config.stats_path()));

        Self {
            library,
            trash,
            deletion,
        }
    }

    /// Empty the trash and drop the removed items from the library view.
    pub fn empty_trash(&mut self, reporter: &dyn ProgressReporter) -> DeletionOutcome {
        let requested = self.trash.ordered_ids();
        let outcome = self.deletion.delete_staged(
            &mut self.trash,
            &requested,
            self.library.snapshot(),
            reporter,
        );
        if outcome.confirmed() > 0 {
            let removed: Vec<String> = outcome.confirmed_ids(&requested).cloned().collect();
            self.library.forget(&removed);
        }
        outcome
    }
}
