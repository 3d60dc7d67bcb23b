//! On-disk thumbnail cache.
//!
//! Every source image under the served root has exactly one cache path,
//! derived from its absolute path alone. A file at that path *is* the cache
//! entry: there is no manifest, no freshness check against the source and no
//! eviction. Entries only ever appear through
//! [`create_thumbnail`](crate::imaging::create_thumbnail), which renames a
//! finished file into place, so existence implies a complete thumbnail.
//!
//! ## Layouts
//!
//! ```text
//! served root  /home/me/album
//! source       /home/me/album/trip/sunset.jpg
//!
//! absolute     <cache>/home/me/album/trip/sunset.jpg   (default)
//! relative     <cache>/trip/sunset.jpg
//! ```
//!
//! The absolute layout lets one cache directory back any number of served
//! trees. The relative layout keeps the cache a mirror of a single tree.
//!
//! ## Concurrency
//!
//! Correctness under concurrent misses comes from the atomic rename alone.
//! On top of that, misses on the same cache path within this process are
//! serialized by a per-path lock, so a burst of requests for one new image
//! decodes it once and the rest observe the hit.

use crate::guard::{ServedRoot, normalize};
use crate::imaging::{
    BackendError, ImageBackend, RustBackend, ThumbnailConfig, create_thumbnail, is_supported_image,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Thumbnail generation failed: {0}")]
    Generation(#[from] BackendError),
}

/// How source paths map onto the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheLayout {
    /// Re-root the whole absolute source path under the cache root.
    #[default]
    Absolute,
    /// Replace the served root prefix with the cache root.
    Relative,
}

/// Snapshot of lookup outcomes since the store was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub generated: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.generated + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} cached, {} generated, {} failed ({} total)",
                self.hits,
                self.generated,
                self.failed,
                self.total()
            )
        } else {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.hits,
                self.generated,
                self.total()
            )
        }
    }
}

type PathLock = Arc<Mutex<()>>;

/// Maps source images to cached thumbnails, generating them on first use.
pub struct ThumbnailStore<B = RustBackend> {
    served_root: ServedRoot,
    cache_root: PathBuf,
    layout: CacheLayout,
    config: ThumbnailConfig,
    backend: B,
    in_flight: Mutex<HashMap<PathBuf, PathLock>>,
    hits: AtomicU32,
    generated: AtomicU32,
    failed: AtomicU32,
}

impl ThumbnailStore<RustBackend> {
    pub fn new(
        served_root: ServedRoot,
        cache_root: &Path,
        layout: CacheLayout,
        config: ThumbnailConfig,
    ) -> Self {
        Self::with_backend(RustBackend::new(), served_root, cache_root, layout, config)
    }
}

impl<B: ImageBackend> ThumbnailStore<B> {
    /// Store generating thumbnails through a specific backend (allows testing with mock).
    pub fn with_backend(
        backend: B,
        served_root: ServedRoot,
        cache_root: &Path,
        layout: CacheLayout,
        config: ThumbnailConfig,
    ) -> Self {
        Self {
            served_root,
            cache_root: normalize(cache_root),
            layout,
            config,
            backend,
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU32::new(0),
            generated: AtomicU32::new(0),
            failed: AtomicU32::new(0),
        }
    }

    pub fn served_root(&self) -> &ServedRoot {
        &self.served_root
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            generated: self.generated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Cache location for `source`.
    ///
    /// Pure: depends only on the (normalized) source path and the store's
    /// roots. Returns `None` for sources outside the served root.
    pub fn cache_path_for(&self, source: &Path) -> Option<PathBuf> {
        let source = normalize(source);
        let relative = source.strip_prefix(self.served_root.path()).ok()?;
        let suffix: PathBuf = match self.layout {
            CacheLayout::Relative => relative.to_path_buf(),
            CacheLayout::Absolute => source
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect(),
        };
        Some(self.cache_root.join(suffix))
    }

    /// Path of a servable thumbnail for `source`, generating it if needed.
    ///
    /// An existing cache file is returned as-is, even if the source has since
    /// changed or disappeared. Failures are not remembered: the next call for
    /// the same source tries again.
    pub fn get(&self, source: &Path) -> Result<PathBuf, StoreError> {
        let source = normalize(source);
        let Some(cache_path) = self.cache_path_for(&source) else {
            return Err(StoreError::SourceNotFound(source));
        };

        if cache_path.is_file() {
            debug!(path = %cache_path.display(), "thumbnail cache hit");
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cache_path);
        }

        if !is_supported_image(&source) || !source.is_file() {
            return Err(StoreError::SourceNotFound(source));
        }

        let lock = self.lock_for(&cache_path);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if cache_path.is_file() {
                // Another request generated it while we waited
                None
            } else {
                info!(source = %source.display(), "generating thumbnail");
                Some(create_thumbnail(
                    &self.backend,
                    &source,
                    &cache_path,
                    &self.config,
                ))
            }
        };
        self.release(&cache_path, lock);

        match result {
            None => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(cache_path)
            }
            Some(Ok(dims)) => {
                self.generated.fetch_add(1, Ordering::Relaxed);
                info!(
                    path = %cache_path.display(),
                    width = dims.width,
                    height = dims.height,
                    "created thumbnail"
                );
                Ok(cache_path)
            }
            Some(Err(e)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(source = %source.display(), error = %e, "thumbnail generation failed");
                Err(StoreError::Generation(e))
            }
        }
    }

    fn lock_for(&self, cache_path: &Path) -> PathLock {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(cache_path.to_path_buf()).or_default())
    }

    fn release(&self, cache_path: &Path, lock: PathLock) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this caller still hold it: nobody is waiting
        if Arc::strong_count(&lock) <= 2 {
            in_flight.remove(cache_path);
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }
}
