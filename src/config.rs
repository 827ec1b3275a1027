use config::{Config, ConfigError, Environment, File as ConfigFile};
use dotenv::dotenv;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the snapshot, trash ledger and stats files.
    pub data_dir: String,
    pub snapshot_file: String,
    pub trash_file: String,
    /// Pre-timestamp trash format, migrated on first open.
    pub legacy_trash_file: String,
    pub stats_file: String,
    /// Roots scanned by the filesystem media store.
    pub media_roots: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub progress_min_stride: usize,
    pub progress_max_updates: usize,
    /// Offset used to derive an item's year. Host local offset when unset.
    pub utc_offset_seconds: Option<i32>,
    pub log_level: String,
    /// Log file, relative to `data_dir`.
    pub log_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            snapshot_file: "index_snapshot.bin".to_string(),
            trash_file: "trash.toml".to_string(),
            legacy_trash_file: "trash_ids.toml".to_string(),
            stats_file: "lifetime_stats.toml".to_string(),
            media_roots: Vec::new(),
            ignore_patterns: Vec::new(),
            progress_min_stride: 250,
            progress_max_updates: 200,
            utc_offset_seconds: None,
            log_level: "info".to_string(),
            log_file: "logs/media-sweep.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Layered load: `.env`, then `MediaSweep.toml` if present, then `MEDIA_SWEEP_*` variables.
    pub fn load() -> Result<AppConfig, ConfigError> {
        dotenv().ok();
        let builder = Config::builder()
            .add_source(ConfigFile::with_name("MediaSweep").required(false))
            .add_source(
                Environment::with_prefix("MEDIA_SWEEP")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("media_roots")
                    .with_list_parse_key("ignore_patterns"),
            )
            .build()?;
        builder.try_deserialize::<AppConfig>()
    }

    /// Same defaults, rooted at `data_dir`. Used by hosts and tests that skip file config.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.snapshot_file)
    }

    pub fn trash_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.trash_file)
    }

    pub fn legacy_trash_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.legacy_trash_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.stats_file)
    }
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        if result.iter().any(|kept| dir_path.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !Path::new(kept).starts_with(dir_path));
        result.push(dir);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_overlapping_no_overlap() {
        let dirs = vec![
            "/home/user/photos".to_string(),
            "/home/user/videos".to_string(),
            "/var/media".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let dirs = vec![
            "/home/user".to_string(),
            "/home/user/photos".to_string(),
            "/var/media".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result, vec!["/home/user".to_string(), "/var/media".to_string()]);
    }

    #[test]
    fn test_non_overlapping_parent_after_children() {
        let dirs = vec![
            "/home/user/photos".to_string(),
            "/home/user/videos".to_string(),
            "/home/user".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result, vec!["/home/user".to_string()]);
    }

    #[test]
    fn test_paths_resolve_under_data_dir() {
        let config = AppConfig::with_data_dir("/tmp/sweep");
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/sweep/index_snapshot.bin"));
        assert_eq!(config.trash_path(), PathBuf::from("/tmp/sweep/trash.toml"));
        assert_eq!(config.legacy_trash_path(), PathBuf::from("/tmp/sweep/trash_ids.toml"));
        assert_eq!(config.stats_path(), PathBuf::from("/tmp/sweep/lifetime_stats.toml"));
        assert_eq!(config.progress_min_stride, 250);
        assert_eq!(config.progress_max_updates, 200);
    }
}
