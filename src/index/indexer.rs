use chrono::{DateTime, Datelike, FixedOffset, Local, Offset, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use super::model::{IndexSnapshot, IndexedItem};
use crate::config::AppConfig;
use crate::media::{MediaItemRef, MediaStore};
use crate::progress::{ProgressReporter, ProgressThrottle};

/// Cooperative cancellation flag, polled once per item by the index walk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-run counters, logged when a run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub total: usize,
    /// Cached entries copied forward verbatim.
    pub reused: usize,
    /// Cached size kept, year recomputed after a creation-date edit.
    pub year_refreshed: usize,
    /// New or changed items whose size was probed from the store.
    pub probed: usize,
    pub skipped_undated: usize,
    pub duration: Duration,
}

/// Outcome of a reindex walk.
///
/// Only a run that reached the end of the enumeration carries an [`IndexSnapshot`];
/// a cancelled run hands back its partial items, which cannot be persisted.
#[derive(Debug)]
pub enum IndexRun {
    Complete {
        snapshot: IndexSnapshot,
        summary: IndexSummary,
    },
    Cancelled {
        items: Vec<IndexedItem>,
        processed: usize,
        total: usize,
    },
}

impl IndexRun {
    pub fn is_complete(&self) -> bool {
        matches!(self, IndexRun::Complete { .. })
    }

    pub fn into_snapshot(self) -> Option<IndexSnapshot> {
        match self {
            IndexRun::Complete { snapshot, .. } => Some(snapshot),
            IndexRun::Cancelled { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndexerSettings {
    pub progress_min_stride: usize,
    pub progress_max_updates: usize,
    /// Offset used to turn a creation timestamp into a calendar year.
    pub year_offset: FixedOffset,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            progress_min_stride: 250,
            progress_max_updates: 200,
            year_offset: Local::now().offset().fix(),
        }
    }
}

impl IndexerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let year_offset = config
            .utc_offset_seconds
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Local::now().offset().fix());
        Self {
            progress_min_stride: config.progress_min_stride,
            progress_max_updates: config.progress_max_updates,
            year_offset,
        }
    }

    pub fn with_year_offset(mut self, year_offset: FixedOffset) -> Self {
        self.year_offset = year_offset;
        self
    }
}

/// Reconciles a live enumeration against the previous snapshot.
pub struct Indexer<'a, S: MediaStore + ?Sized> {
    store: &'a S,
    settings: IndexerSettings,
}

impl<'a, S: MediaStore + ?Sized> Indexer<'a, S> {
    pub fn new(store: &'a S, settings: IndexerSettings) -> Self {
        Self { store, settings }
    }

    /// Build a new snapshot from `enumeration`, reusing derived data from `previous`
    /// for every item that has not changed since `previous` was indexed.
    pub fn reindex(
        &self,
        previous: Option<&IndexSnapshot>,
        enumeration: &[MediaItemRef],
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> IndexRun {
        let start = Instant::now();
        let total = enumeration.len();
        let throttle = ProgressThrottle::new(
            total,
            self.settings.progress_min_stride,
            self.settings.progress_max_updates,
        );
        debug!(
            "Reindexing {} items against {} cached (stride {})",
            total,
            previous.map(IndexSnapshot::len).unwrap_or(0),
            throttle.stride()
        );

        let mut summary = IndexSummary {
            total,
            ..IndexSummary::default()
        };
        let mut items = Vec::with_capacity(total);
        reporter.on_index_start(total);

        for (idx, media) in enumeration.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Reindex cancelled after {} of {} items", idx, total);
                reporter.on_index_cancelled(idx, total);
                return IndexRun::Cancelled {
                    items,
                    processed: idx,
                    total,
                };
            }

            if let Some(item) = self.derive(media, previous, &mut summary) {
                items.push(item);
            }

            let processed = idx + 1;
            if throttle.should_report(processed) {
                reporter.on_index_progress(processed, total);
            }
        }

        summary.duration = start.elapsed();
        let snapshot = IndexSnapshot::new(Utc::now(), items);
        info!(
            "Indexed {} items in {:.2}s: {} reused, {} year refreshed, {} probed, {} undated skipped",
            snapshot.len(),
            summary.duration.as_secs_f64(),
            summary.reused,
            summary.year_refreshed,
            summary.probed,
            summary.skipped_undated,
        );
        reporter.on_index_complete(snapshot.len(), summary.duration.as_secs_f64());

        IndexRun::Complete { snapshot, summary }
    }

    fn derive(
        &self,
        media: &MediaItemRef,
        previous: Option<&IndexSnapshot>,
        summary: &mut IndexSummary,
    ) -> Option<IndexedItem> {
        let (Some(created), Some(changed_at)) = (media.created, media.change_timestamp()) else {
            trace!("{} has no creation date, skipping", media.id);
            summary.skipped_undated += 1;
            return None;
        };
        let year = self.year_of(created);

        if let Some(previous) = previous {
            if let Some(cached) = previous.get(&media.id) {
                if changed_at <= previous.indexed_at() {
                    if cached.year == year {
                        summary.reused += 1;
                        return Some(cached.clone());
                    }
                    trace!("{} moved from {} to {}", media.id, cached.year, year);
                    summary.year_refreshed += 1;
                    return Some(IndexedItem {
                        year,
                        ..cached.clone()
                    });
                }
            }
        }

        trace!("Probing size of {}", media.id);
        summary.probed += 1;
        Some(IndexedItem {
            id: media.id.clone(),
            year,
            byte_size: self.store.byte_size(media),
            changed_at,
        })
    }

    fn year_of(&self, created: DateTime<Utc>) -> i32 {
        created.with_timezone(&self.settings.year_offset).year()
    }
}
