#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use media_sweep::index::IndexerSettings;
use media_sweep::media::{
    DeleteReport, MediaItemRef, MediaKind, MediaStore, MediaStoreError, ResolvedHandle,
};
use media_sweep::progress::ProgressReporter;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn photo(id: &str, year: i32) -> MediaItemRef {
    MediaItemRef::new(id, Some(at(year, 6, 15)), MediaKind::Photo)
}

pub fn ids(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("item-{}", i)).collect()
}

pub fn utc_settings() -> IndexerSettings {
    IndexerSettings::default().with_year_offset(FixedOffset::east_opt(0).unwrap())
}

/// In-memory media library with scripted failures and call counters.
#[derive(Default)]
pub struct MockStore {
    items: Mutex<Vec<MediaItemRef>>,
    sizes: Mutex<HashMap<String, u64>>,
    failing_ids: Mutex<HashSet<String>>,
    enumerate_error: Mutex<Option<MediaStoreError>>,
    resolve_error: Mutex<Option<MediaStoreError>>,
    delete_error: Mutex<Option<MediaStoreError>>,
    enumerate_gate: Mutex<Option<Receiver<()>>>,
    probe_gate: Mutex<Option<Receiver<()>>>,
    pub size_probes: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, item: MediaItemRef, size: u64) {
        self.sizes.lock().unwrap().insert(item.id.clone(), size);
        let mut items = self.items.lock().unwrap();
        items.retain(|existing| existing.id != item.id);
        items.push(item);
    }

    pub fn with_items(items: impl IntoIterator<Item = (MediaItemRef, u64)>) -> Self {
        let store = Self::new();
        for (item, size) in items {
            store.add(item, size);
        }
        store
    }

    pub fn set_size(&self, id: &str, size: u64) {
        self.sizes.lock().unwrap().insert(id.to_string(), size);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.lock().unwrap().iter().any(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// These ids survive a bulk delete and are reported back as failed.
    pub fn fail_deleting(&self, ids: &[String]) {
        self.failing_ids
            .lock()
            .unwrap()
            .extend(ids.iter().cloned());
    }

    pub fn fail_enumerate_with(&self, error: MediaStoreError) {
        *self.enumerate_error.lock().unwrap() = Some(error);
    }

    pub fn fail_resolve_with(&self, error: MediaStoreError) {
        *self.resolve_error.lock().unwrap() = Some(error);
    }

    pub fn fail_delete_with(&self, error: MediaStoreError) {
        *self.delete_error.lock().unwrap() = Some(error);
    }

    /// The next `enumerate` blocks until the returned sender fires (or is dropped).
    pub fn hold_enumeration(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.enumerate_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// The next `byte_size` call blocks until the returned sender fires (or is dropped).
    pub fn hold_probes(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.probe_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn probes(&self) -> usize {
        self.size_probes.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

impl MediaStore for MockStore {
    fn enumerate(&self) -> Result<Vec<MediaItemRef>, MediaStoreError> {
        let gate = self.enumerate_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        if let Some(error) = self.enumerate_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.items.lock().unwrap().clone())
    }

    fn byte_size(&self, item: &MediaItemRef) -> u64 {
        let gate = self.probe_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        self.size_probes.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().unwrap().get(&item.id).copied().unwrap_or(0)
    }

    fn resolve(&self, ids: &[String]) -> Result<Vec<ResolvedHandle>, MediaStoreError> {
        if let Some(error) = self.resolve_error.lock().unwrap().clone() {
            return Err(error);
        }
        let items = self.items.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| items.iter().any(|item| &item.id == *id))
            .map(|id| ResolvedHandle { id: id.clone() })
            .collect())
    }

    fn bulk_delete(&self, handles: &[ResolvedHandle]) -> Result<DeleteReport, MediaStoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.delete_error.lock().unwrap().clone() {
            return Err(error);
        }

        let failing = self.failing_ids.lock().unwrap();
        let (failed, removed): (Vec<_>, Vec<_>) = handles
            .iter()
            .map(|h| h.id.clone())
            .partition(|id| failing.contains(id));
        self.items
            .lock()
            .unwrap()
            .retain(|item| !removed.contains(&item.id));
        Ok(DeleteReport::with_failures(failed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start(usize),
    Progress(usize, usize),
    Complete(usize),
    Cancelled(usize, usize),
    DeleteStart(usize),
    DeleteComplete(usize, usize),
}

/// Records every callback in order.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_index_start(&self, total: usize) {
        self.push(Event::Start(total));
    }

    fn on_index_progress(&self, processed: usize, total: usize) {
        self.push(Event::Progress(processed, total));
    }

    fn on_index_complete(&self, indexed: usize, _duration_secs: f64) {
        self.push(Event::Complete(indexed));
    }

    fn on_index_cancelled(&self, processed: usize, total: usize) {
        self.push(Event::Cancelled(processed, total));
    }

    fn on_delete_start(&self, requested: usize) {
        self.push(Event::DeleteStart(requested));
    }

    fn on_delete_complete(&self, confirmed: usize, unconfirmed: usize) {
        self.push(Event::DeleteComplete(confirmed, unconfirmed));
    }
}
