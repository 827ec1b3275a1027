//! Bulk permanent deletion against the media store.

pub mod executor;
pub mod outcome;

pub use executor::DeletionExecutor;
pub use outcome::{DeletionError, DeletionOutcome};
