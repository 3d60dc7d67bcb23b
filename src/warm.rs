//! Cache warm-up: generate thumbnails for a whole tree ahead of browsing.
//!
//! Walks the served root the way the gallery sees it (dotfiles and dot
//! directories skipped, JPEGs only) and pushes every image through the
//! store in parallel on the global rayon pool. Existing entries count as
//! hits, so re-running on a warm cache is cheap.

use crate::imaging::{ImageBackend, is_supported_image};
use crate::store::{CacheStats, ThumbnailStore};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum WarmError {
    #[error("Cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Every gallery-visible JPEG under `root`, in walk order.
///
/// Unreadable subdirectories are logged and skipped; only a failure to read
/// `root` itself is an error.
pub fn find_images(root: &Path) -> Result<Vec<PathBuf>, WarmError> {
    let mut images = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(WarmError::Walk {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// Generate missing thumbnails for everything under the store's served root.
///
/// Failures on individual images are logged by the store and counted; they
/// do not stop the run.
pub fn warm<B: ImageBackend>(store: &ThumbnailStore<B>) -> Result<CacheStats, WarmError> {
    let images = find_images(store.served_root().path())?;
    info!(
        count = images.len(),
        threads = rayon::current_num_threads(),
        "warming thumbnail cache"
    );

    images.par_iter().for_each(|source| {
        // Errors are already logged and counted by the store
        let _ = store.get(source);
    });

    Ok(store.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::ServedRoot;
    use crate::imaging::ThumbnailConfig;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::store::CacheLayout;
    use crate::test_helpers::setup_album;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn find_images_skips_hidden_and_non_images() {
        let album = setup_album();
        std::fs::create_dir(album.path().join(".thumbs")).unwrap();
        std::fs::write(album.path().join(".thumbs/x.jpg"), "x").unwrap();

        let images = find_images(album.path()).unwrap();

        assert_eq!(
            names(&images, album.path()),
            vec![
                "cover.JPG",
                "trip/beach.jpeg",
                "trip/broken.jpg",
                "trip/sunset.jpg"
            ]
        );
    }

    #[test]
    fn find_images_missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = find_images(&tmp.path().join("gone"));
        assert!(matches!(result, Err(WarmError::Walk { .. })));
    }

    #[test]
    fn warm_generates_every_image_once() {
        let album = setup_album();
        let cache = TempDir::new().unwrap();
        let backend = MockBackend::new();
        backend.fail_on(&album.path().join("trip/broken.jpg"));
        let store = ThumbnailStore::with_backend(
            backend,
            ServedRoot::new(album.path()).unwrap(),
            cache.path(),
            CacheLayout::Relative,
            ThumbnailConfig::default(),
        );

        let stats = warm(&store).unwrap();

        assert_eq!(
            stats,
            CacheStats {
                hits: 0,
                generated: 3,
                failed: 1
            }
        );
        assert!(cache.path().join("trip/sunset.jpg").is_file());
        assert!(cache.path().join("cover.JPG").is_file());
        assert!(!cache.path().join("trip/broken.jpg").exists());
    }

    #[test]
    fn warm_twice_only_hits() {
        let album = setup_album();
        let cache = TempDir::new().unwrap();
        let store = ThumbnailStore::with_backend(
            MockBackend::new(),
            ServedRoot::new(album.path()).unwrap(),
            cache.path(),
            CacheLayout::Absolute,
            ThumbnailConfig::default(),
        );

        warm(&store).unwrap();
        let stats = warm(&store).unwrap();

        // Counters are cumulative; the second pass is all hits
        assert_eq!(stats.generated, 4);
        assert_eq!(stats.hits, 4);
    }

    #[test]
    fn warm_uses_configured_box() {
        let album = setup_album();
        let cache = TempDir::new().unwrap();
        let store = ThumbnailStore::with_backend(
            MockBackend::new(),
            ServedRoot::new(album.path()).unwrap(),
            cache.path(),
            CacheLayout::Absolute,
            ThumbnailConfig {
                max_width: 100,
                max_height: 80,
                ..ThumbnailConfig::default()
            },
        );

        warm(&store).unwrap();

        let ops = store.backend().get_operations();
        assert_eq!(ops.len(), 4);
        assert!(ops.iter().all(|op| matches!(
            op,
            RecordedOp::Thumbnail {
                max_width: 100,
                max_height: 80,
                ..
            }
        )));
    }
}
