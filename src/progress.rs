use std::sync::mpsc::Sender;

/// Trait for reporting indexing and deletion progress.
///
/// Hosts implement it to drive their UI; all methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_index_start(&self, _total: usize) {}
    fn on_index_progress(&self, _processed: usize, _total: usize) {}
    fn on_index_complete(&self, _indexed: usize, _duration_secs: f64) {}
    fn on_index_cancelled(&self, _processed: usize, _total: usize) {}
    /// The external store gives no interim progress, so deletion is only bracketed.
    fn on_delete_start(&self, _requested: usize) {}
    fn on_delete_complete(&self, _confirmed: usize, _unconfirmed: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Message delivered to the foreground while an index run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexProgress {
    Started { total: usize },
    Progress { processed: usize, total: usize },
    /// Always the last message of a run.
    Finished { complete: bool },
}

/// Forwards index progress over a channel to whoever holds the receiver.
///
/// A dropped receiver is not an error; the run simply continues unobserved.
pub struct ChannelReporter {
    tx: Sender<IndexProgress>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<IndexProgress>) -> Self {
        Self { tx }
    }

    fn send(&self, message: IndexProgress) {
        let _ = self.tx.send(message);
    }
}

impl ProgressReporter for ChannelReporter {
    fn on_index_start(&self, total: usize) {
        self.send(IndexProgress::Started { total });
    }

    fn on_index_progress(&self, processed: usize, total: usize) {
        self.send(IndexProgress::Progress { processed, total });
    }

    fn on_index_complete(&self, _indexed: usize, _duration_secs: f64) {
        self.send(IndexProgress::Finished { complete: true });
    }

    fn on_index_cancelled(&self, _processed: usize, _total: usize) {
        self.send(IndexProgress::Finished { complete: false });
    }
}

/// Decides which `(processed, total)` pairs are worth reporting.
///
/// Reports the first and last item and every `stride` items in between, where
/// `stride = max(min_stride, total / max_updates)`.
#[derive(Debug, Clone, Copy)]
pub struct ProgressThrottle {
    total: usize,
    stride: usize,
}

impl ProgressThrottle {
    pub fn new(total: usize, min_stride: usize, max_updates: usize) -> Self {
        let stride = min_stride.max(total / max_updates.max(1)).max(1);
        Self { total, stride }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `processed` is 1-based: the count of items handled so far.
    pub fn should_report(&self, processed: usize) -> bool {
        processed == 1 || processed == self.total || processed % self.stride == 0
    }
}
