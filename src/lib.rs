pub mod aggregate;
pub mod config;
pub mod deletion;
pub mod error;
pub mod facade;
pub mod index;
pub mod logging;
pub mod media;
pub mod persist;
pub mod progress;
pub mod stats;
pub mod trash;

pub use aggregate::YearBucket;
pub use config::AppConfig;
pub use deletion::{DeletionError, DeletionOutcome};
pub use error::Error;
pub use facade::{DeletionFacade, MediaSweep, PhotoLibraryFacade, Refresh, Refreshed, TrashFacade};
pub use media::{FsMediaStore, MediaStore};
pub use progress::{ProgressReporter, SilentReporter};
