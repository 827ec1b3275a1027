use indicatif::{HumanBytes, HumanCount};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::persist;

/// Lifetime totals across every completed deletion. Never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeStats {
    pub items_removed: u64,
    pub bytes_reclaimed: u64,
}

impl fmt::Display for LifetimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items removed, {} reclaimed",
            HumanCount(self.items_removed),
            HumanBytes(self.bytes_reclaimed)
        )
    }
}

/// Persisted lifetime counters.
#[derive(Debug)]
pub struct StatsAccumulator {
    path: PathBuf,
    totals: LifetimeStats,
}

impl StatsAccumulator {
    /// Load totals from `path`; a missing or unreadable file starts from zero.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let totals = match load(&path) {
            Ok(Some(totals)) => totals,
            Ok(None) => LifetimeStats::default(),
            Err(e) => {
                warn!("Unreadable stats {}, starting from zero: {}", path.display(), e);
                LifetimeStats::default()
            }
        };
        debug!("Lifetime stats: {}", totals);
        Self { path, totals }
    }

    pub fn totals(&self) -> LifetimeStats {
        self.totals
    }

    /// Add one completed deletion to the totals and save immediately.
    pub fn record(&mut self, items_removed: u64, bytes_reclaimed: u64) {
        self.totals.items_removed = self.totals.items_removed.saturating_add(items_removed);
        self.totals.bytes_reclaimed = self.totals.bytes_reclaimed.saturating_add(bytes_reclaimed);
        info!(
            "Recorded {} items / {}; lifetime {}",
            items_removed,
            HumanBytes(bytes_reclaimed),
            self.totals
        );

        if let Err(e) = save(&self.path, &self.totals) {
            warn!("Failed to save stats to {}: {}", self.path.display(), e);
        }
    }
}

/// Bytes attributed to a partially successful deletion: `total * confirmed / requested`.
pub fn proportional_bytes(total_bytes: u64, confirmed: usize, requested: usize) -> u64 {
    if requested == 0 {
        return 0;
    }
    let confirmed = confirmed.min(requested) as u128;
    (total_bytes as u128 * confirmed / requested as u128) as u64
}

fn load(path: &Path) -> Result<Option<LifetimeStats>> {
    let Some(bytes) = persist::read_optional(path)? else {
        return Ok(None);
    };
    Ok(Some(toml::from_str(&String::from_utf8_lossy(&bytes))?))
}

fn save(path: &Path, totals: &LifetimeStats) -> Result<()> {
    let text = toml::to_string(totals)?;
    persist::write_atomic(path, text.as_bytes())?;
    Ok(())
}
