//! Boundary to the external media store.
//!
//! The core never owns media; it enumerates, probes sizes, resolves ids and asks for bulk
//! deletion through [`MediaStore`]. Hosts plug in their platform library, and
//! [`fs_store::FsMediaStore`] serves plain directory trees.

pub mod fs_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fs_store::FsMediaStore;

/// Coarse media kind reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
    LivePhoto,
    Unknown,
}

/// One item as enumerated by the store. Read-only input to the indexer.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItemRef {
    pub id: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub kind: MediaKind,
    /// Seconds; 0 for anything that is not a video.
    pub duration: f64,
}

impl MediaItemRef {
    pub fn new(id: impl Into<String>, created: Option<DateTime<Utc>>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            created,
            modified: None,
            kind,
            duration: 0.0,
        }
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// max(created, modified). `None` only when the creation date is missing.
    pub fn change_timestamp(&self) -> Option<DateTime<Utc>> {
        let created = self.created?;
        Some(match self.modified {
            Some(modified) if modified > created => modified,
            _ => created,
        })
    }
}

/// A store-side handle for an id that still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHandle {
    pub id: String,
}

/// Result of a bulk delete the store accepted.
///
/// Stores that can only succeed or fail wholesale always return an empty `failed` list;
/// stores with per-item results name the ids they could not remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub failed: Vec<String>,
}

impl DeleteReport {
    pub fn complete() -> Self {
        Self::default()
    }

    pub fn with_failures(failed: Vec<String>) -> Self {
        Self { failed }
    }
}

/// Classified failure of an external store call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaStoreError {
    #[error("access to the media library was denied")]
    PermissionDenied,

    #[error("access to the media library was revoked during the operation")]
    PermissionRevoked,

    #[error("the operation was cancelled by the user")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Platform media library as seen by the core.
pub trait MediaStore: Send + Sync {
    /// Every item currently in the library, in any order.
    fn enumerate(&self) -> Result<Vec<MediaItemRef>, MediaStoreError>;

    /// Estimated on-disk size of an item. Expensive; the indexer avoids calling it for
    /// items it can reuse from the previous snapshot. Unknown sizes are reported as 0.
    fn byte_size(&self, item: &MediaItemRef) -> u64;

    /// Handles for the ids that still exist. Missing ids are simply absent from the result.
    fn resolve(&self, ids: &[String]) -> Result<Vec<ResolvedHandle>, MediaStoreError>;

    /// Permanently delete the resolved items in one request.
    fn bulk_delete(&self, handles: &[ResolvedHandle]) -> Result<DeleteReport, MediaStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_change_timestamp_prefers_later_modification() {
        let created = Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap();
        let modified = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let item = MediaItemRef::new("a", Some(created), MediaKind::Photo).with_modified(modified);
        assert_eq!(item.change_timestamp(), Some(modified));
    }

    #[test]
    fn test_change_timestamp_ignores_earlier_modification() {
        let created = Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap();
        let modified = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let item = MediaItemRef::new("a", Some(created), MediaKind::Photo).with_modified(modified);
        assert_eq!(item.change_timestamp(), Some(created));
    }

    #[test]
    fn test_change_timestamp_requires_creation_date() {
        let modified = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let item = MediaItemRef::new("a", None, MediaKind::Video).with_modified(modified);
        assert_eq!(item.change_timestamp(), None);
    }
}
