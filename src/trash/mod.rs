//! Staged-deletion ledger ("trash").

pub mod ledger;
pub mod persist;

pub use ledger::{TrashEntry, TrashLedger};
pub use persist::LedgerFiles;
