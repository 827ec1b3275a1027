//! Incremental index of the media library and its persisted snapshot.

pub mod indexer;
pub mod model;
pub mod snapshot_store;

pub use indexer::{CancelToken, IndexRun, IndexSummary, Indexer, IndexerSettings};
pub use model::{IndexSnapshot, IndexedItem, SCHEMA_VERSION};
pub use snapshot_store::SnapshotStore;
