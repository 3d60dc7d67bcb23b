//! High-level image operations.
//!
//! [`create_thumbnail`] owns file placement: it creates the destination
//! directory, has the backend encode into a temporary file next to the
//! destination and renames it into place. A reader of the destination path
//! therefore sees either nothing or a complete thumbnail, and a failed
//! generation leaves nothing behind.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Quality, Sharpening, ThumbnailParams};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Prefix for in-progress thumbnail files. The leading dot keeps them out of
/// directory listings.
const TEMP_PREFIX: &str = ".lk-";
const TEMP_SUFFIX: &str = ".part";

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl Default for ThumbnailConfig {
    /// 230px square, the size the gallery page displays thumbnails at.
    fn default() -> Self {
        Self {
            max_width: 230,
            max_height: 230,
            quality: Quality::default(),
            sharpening: None,
        }
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(source: &Path, config: &ThumbnailConfig) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        max_width: config.max_width,
        max_height: config.max_height,
        quality: config.quality,
        sharpening: config.sharpening,
    }
}

/// Generate a thumbnail of `source` at `dest`, atomically.
///
/// Missing parent directories are created; a directory created concurrently
/// by another generator is fine. An existing file at `dest` is replaced.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    dest: &Path,
    config: &ThumbnailConfig,
) -> Result<Dimensions> {
    let dir = dest.parent().ok_or_else(|| {
        BackendError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", dest.display()),
        ))
    })?;
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)?;

    let params = plan_thumbnail(source, config);
    let dims = {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let dims = backend.thumbnail(&params, &mut writer)?;
        writer.flush()?;
        dims
    };
    tmp.as_file().sync_all()?;

    // On any error above, dropping `tmp` removes the partial file.
    tmp.persist(dest).map_err(|e| BackendError::Io(e.error))?;
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::RustBackend;
    use crate::test_helpers::{dir_entries, write_test_jpeg};
    use tempfile::TempDir;

    #[test]
    fn plan_thumbnail_uses_config_box() {
        let config = ThumbnailConfig {
            max_width: 320,
            max_height: 180,
            quality: Quality::new(70),
            sharpening: Some(Sharpening::light()),
        };
        let params = plan_thumbnail(Path::new("/source.jpg"), &config);

        assert_eq!(params.max_width, 320);
        assert_eq!(params.max_height, 180);
        assert_eq!(params.quality.value(), 70);
        assert_eq!(params.sharpening, Some(Sharpening::light()));
    }

    #[test]
    fn default_config_is_230_square() {
        let config = ThumbnailConfig::default();
        assert_eq!((config.max_width, config.max_height), (230, 230));
        assert!(config.sharpening.is_none());
    }

    #[test]
    fn create_thumbnail_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("cache/a/b/pic.jpg");
        let backend = MockBackend::new();

        create_thumbnail(
            &backend,
            Path::new("/photos/a/b/pic.jpg"),
            &dest,
            &ThumbnailConfig::default(),
        )
        .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"thumb:/photos/a/b/pic.jpg");
        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Thumbnail {
                max_width: 230,
                max_height: 230,
                ..
            }
        ));
    }

    #[test]
    fn create_thumbnail_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("pic.jpg");

        create_thumbnail(
            &MockBackend::new(),
            Path::new("/photos/pic.jpg"),
            &dest,
            &ThumbnailConfig::default(),
        )
        .unwrap();

        assert_eq!(dir_entries(tmp.path()), vec!["pic.jpg".to_string()]);
    }

    #[test]
    fn failed_generation_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out/bad.jpg");
        let backend = MockBackend::new();
        backend.fail_on(Path::new("/photos/bad.jpg"));

        let result = create_thumbnail(
            &backend,
            Path::new("/photos/bad.jpg"),
            &dest,
            &ThumbnailConfig::default(),
        );

        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert!(!dest.exists());
        assert!(dir_entries(&tmp.path().join("out")).is_empty());
    }

    #[test]
    fn existing_destination_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("pic.jpg");
        fs::write(&dest, "stale").unwrap();

        create_thumbnail(
            &MockBackend::new(),
            Path::new("/photos/pic.jpg"),
            &dest,
            &ThumbnailConfig::default(),
        )
        .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"thumb:/photos/pic.jpg");
    }

    #[test]
    fn real_backend_writes_decodable_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src/sunset.jpg");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        write_test_jpeg(&source, 640, 480);
        let dest = tmp.path().join("cache/sunset.jpg");

        let dims = create_thumbnail(
            &RustBackend::new(),
            &source,
            &dest,
            &ThumbnailConfig::default(),
        )
        .unwrap();

        assert_eq!(dims, Dimensions { width: 230, height: 173 });
        assert_eq!(image::image_dimensions(&dest).unwrap(), (230, 173));
    }

    #[test]
    fn destination_without_parent_is_rejected() {
        let result = create_thumbnail(
            &MockBackend::new(),
            Path::new("/photos/pic.jpg"),
            Path::new("/"),
            &ThumbnailConfig::default(),
        );
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
