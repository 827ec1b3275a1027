use std::collections::HashSet;
use thiserror::Error;

use crate::media::MediaStoreError;

/// Why a deletion request confirmed nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeletionError {
    #[error("nothing to delete")]
    NothingToDelete,

    #[error("access to the media library was denied")]
    PermissionDenied,

    #[error("access to the media library was revoked during deletion")]
    PermissionRevoked,

    #[error("deletion was cancelled")]
    Cancelled,

    #[error("deletion failed: {0}")]
    Other(String),
}

impl DeletionError {
    /// Whether the host should show this as an error. Cancellation and an empty trash are
    /// neutral outcomes.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, DeletionError::NothingToDelete | DeletionError::Cancelled)
    }

    /// Permission problems need the user to act first; only opaque failures are worth
    /// offering a retry for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeletionError::Other(_))
    }
}

impl From<MediaStoreError> for DeletionError {
    fn from(e: MediaStoreError) -> Self {
        match e {
            MediaStoreError::PermissionDenied => DeletionError::PermissionDenied,
            MediaStoreError::PermissionRevoked => DeletionError::PermissionRevoked,
            MediaStoreError::Cancelled => DeletionError::Cancelled,
            MediaStoreError::Other(msg) => DeletionError::Other(msg),
        }
    }
}

/// Result of one executor call.
///
/// `requested` is always `confirmed + unconfirmed.len()`; the "nothing to delete" outcome
/// has all three at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    confirmed: usize,
    unconfirmed: Vec<String>,
    error: Option<DeletionError>,
}

impl DeletionOutcome {
    pub fn nothing_to_delete() -> Self {
        Self {
            confirmed: 0,
            unconfirmed: Vec::new(),
            error: Some(DeletionError::NothingToDelete),
        }
    }

    /// The store accepted the request; `unconfirmed` names the ids it could not remove.
    pub(crate) fn removed(requested: usize, unconfirmed: Vec<String>) -> Self {
        Self {
            confirmed: requested - unconfirmed.len(),
            unconfirmed,
            error: None,
        }
    }

    pub(crate) fn failed(requested: Vec<String>, error: DeletionError) -> Self {
        Self {
            confirmed: 0,
            unconfirmed: requested,
            error: Some(error),
        }
    }

    pub fn requested(&self) -> usize {
        self.confirmed + self.unconfirmed.len()
    }

    pub fn confirmed(&self) -> usize {
        self.confirmed
    }

    /// Ids that may still exist, in request order.
    pub fn unconfirmed(&self) -> &[String] {
        &self.unconfirmed
    }

    pub fn error(&self) -> Option<&DeletionError> {
        self.error.as_ref()
    }

    pub fn is_nothing_to_delete(&self) -> bool {
        self.error == Some(DeletionError::NothingToDelete)
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.unconfirmed.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        self.error.is_none() && !self.unconfirmed.is_empty()
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some() && !self.is_nothing_to_delete()
    }

    /// Requested ids that were confirmed gone, in request order.
    pub fn confirmed_ids<'a>(&'a self, requested: &'a [String]) -> impl Iterator<Item = &'a String> {
        let unconfirmed: HashSet<&str> = self.unconfirmed.iter().map(String::as_str).collect();
        requested
            .iter()
            .filter(move |id| !unconfirmed.contains(id.as_str()))
    }
}
