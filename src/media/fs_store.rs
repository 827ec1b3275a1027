use chrono::{DateTime, Utc};
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use super::{DeleteReport, MediaItemRef, MediaKind, MediaStore, MediaStoreError, ResolvedHandle};
use crate::config::{self, AppConfig};

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "heic", "heif", "gif", "webp", "tif", "tiff", "bmp", "dng", "raw",
    "cr2", "cr3", "nef", "arw", "orf", "raf", "rw2",
];
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "m4v", "avi", "mkv", "3gp", "mts", "webm"];

/// Media store over plain directory trees. Item ids are canonical file paths.
///
/// Filesystems without a birth time report the modification time as the creation date.
pub struct FsMediaStore {
    roots: Vec<PathBuf>,
    ignore_patterns: Vec<Pattern>,
}

impl FsMediaStore {
    pub fn new(root_paths: Vec<String>, ignore_globs: &[String]) -> Self {
        let roots = config::non_overlapping_directories(root_paths)
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            roots,
            ignore_patterns,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.media_roots.clone(), &config.ignore_patterns)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }

    fn collect_candidate_paths(&self) -> Result<Vec<PathBuf>, MediaStoreError> {
        let mut paths = Vec::new();

        for root in &self.roots {
            if !root.is_dir() {
                warn!("Media root {} is not a directory, skipping", root.display());
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|entry| !self.is_ignored(entry.path()));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        let denied = err
                            .io_error()
                            .map(|e| e.kind() == io::ErrorKind::PermissionDenied)
                            .unwrap_or(false);
                        if denied && err.depth() == 0 {
                            return Err(MediaStoreError::PermissionDenied);
                        }
                        error!("Error walking {}: {}", root.display(), err);
                        continue;
                    }
                };

                if entry.file_type().is_file() && media_kind(entry.path()) != MediaKind::Unknown {
                    paths.push(entry.into_path());
                }
            }
        }

        Ok(paths)
    }
}

impl MediaStore for FsMediaStore {
    fn enumerate(&self) -> Result<Vec<MediaItemRef>, MediaStoreError> {
        let paths = self.collect_candidate_paths()?;
        debug!("{} candidate media files under {} roots", paths.len(), self.roots.len());

        let items = paths
            .par_iter()
            .filter_map(|path| match item_from_path(path) {
                Ok(item) => item,
                Err(e) => {
                    error!("Error reading metadata for {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        Ok(items)
    }

    fn byte_size(&self, item: &MediaItemRef) -> u64 {
        fs::metadata(&item.id).map(|m| m.len()).unwrap_or(0)
    }

    fn resolve(&self, ids: &[String]) -> Result<Vec<ResolvedHandle>, MediaStoreError> {
        Ok(ids
            .iter()
            .filter(|id| Path::new(id.as_str()).is_file())
            .map(|id| ResolvedHandle { id: id.clone() })
            .collect())
    }

    fn bulk_delete(&self, handles: &[ResolvedHandle]) -> Result<DeleteReport, MediaStoreError> {
        let failures: Vec<(String, io::ErrorKind)> = handles
            .par_iter()
            .filter_map(|handle| match fs::remove_file(&handle.id) {
                Ok(()) => None,
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => {
                    error!("Failed to remove '{}': {}", handle.id, e);
                    Some((handle.id.clone(), e.kind()))
                }
            })
            .collect();

        let all_denied = !failures.is_empty()
            && failures.len() == handles.len()
            && failures
                .iter()
                .all(|(_, kind)| *kind == io::ErrorKind::PermissionDenied);
        if all_denied {
            return Err(MediaStoreError::PermissionDenied);
        }

        Ok(DeleteReport::with_failures(
            failures.into_iter().map(|(id, _)| id).collect(),
        ))
    }
}

fn item_from_path(path: &Path) -> io::Result<Option<MediaItemRef>> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_symlink() || metadata.len() == 0 {
        return Ok(None);
    }

    let canonical = fs::canonicalize(path)?;
    // Ids must name the file exactly; a lossy conversion would not resolve back to it.
    let Some(id) = canonical.to_str().map(str::to_string) else {
        warn!("Skipping {}: path is not valid UTF-8", canonical.display());
        return Ok(None);
    };
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let created = metadata
        .created()
        .ok()
        .map(DateTime::<Utc>::from)
        .or(modified);

    Ok(Some(MediaItemRef {
        id,
        created,
        modified,
        kind: media_kind(path),
        duration: 0.0,
    }))
}

fn media_kind(path: &Path) -> MediaKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return MediaKind::Unknown;
    };
    let ext = ext.to_ascii_lowercase();
    if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Photo
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_by_extension() {
        assert_eq!(media_kind(Path::new("/a/IMG_0001.HEIC")), MediaKind::Photo);
        assert_eq!(media_kind(Path::new("/a/clip.mov")), MediaKind::Video);
        assert_eq!(media_kind(Path::new("/a/notes.txt")), MediaKind::Unknown);
        assert_eq!(media_kind(Path::new("/a/README")), MediaKind::Unknown);
    }
}
