//! Pure Rust thumbnail backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG) | `image::ImageReader` with the `jpeg` feature |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_fit_dimensions;
use super::params::ThumbnailParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Write;
use std::path::Path;

/// Extensions served as images, compared case-insensitively.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Whether a path names a file this backend can thumbnail, judged by
/// extension alone.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
}

impl ImageBackend for RustBackend {
    fn thumbnail(
        &self,
        params: &ThumbnailParams,
        out: &mut dyn Write,
    ) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;

        let (width, height) = calculate_fit_dimensions(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);

        let final_img = if let Some(sharpening) = params.sharpening {
            DynamicImage::from(image::imageops::unsharpen(
                &resized,
                sharpening.sigma,
                sharpening.threshold,
            ))
        } else {
            resized
        };

        // JPEG has no alpha channel and only 8-bit samples
        let rgb = DynamicImage::ImageRgb8(final_img.to_rgb8());
        let encoder = JpegEncoder::new_with_quality(out, params.quality.value() as u8);
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(e.to_string()))?;

        Ok(Dimensions { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Quality, Sharpening};
    use crate::test_helpers::write_test_jpeg;
    use tempfile::TempDir;

    fn params(source: &Path, max: u32) -> ThumbnailParams {
        ThumbnailParams {
            source: source.to_path_buf(),
            max_width: max,
            max_height: max,
            quality: Quality::default(),
            sharpening: None,
        }
    }

    #[test]
    fn supported_extension_check_is_case_insensitive() {
        assert!(is_supported_image(Path::new("/a/b.jpg")));
        assert!(is_supported_image(Path::new("/a/b.JPEG")));
        assert!(is_supported_image(Path::new("/a/b.JpG")));
        assert!(!is_supported_image(Path::new("/a/b.png")));
        assert!(!is_supported_image(Path::new("/a/note.txt")));
        assert!(!is_supported_image(Path::new("/a/jpg")));
    }

    #[test]
    fn thumbnail_fits_landscape_into_box() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 800, 600);

        let mut buf = Vec::new();
        let dims = RustBackend::new()
            .thumbnail(&params(&source, 230), &mut buf)
            .unwrap();

        assert_eq!(dims, Dimensions { width: 230, height: 173 });
        let decoded = image::load_from_memory(&buf).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (230, 173));
    }

    #[test]
    fn thumbnail_fits_portrait_into_box() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 300, 600);

        let mut buf = Vec::new();
        let dims = RustBackend::new()
            .thumbnail(&params(&source, 200), &mut buf)
            .unwrap();

        assert_eq!(dims, Dimensions { width: 100, height: 200 });
    }

    #[test]
    fn thumbnail_output_is_jpeg() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 64, 64);

        let mut buf = Vec::new();
        RustBackend::new()
            .thumbnail(&params(&source, 32), &mut buf)
            .unwrap();

        assert_eq!(
            image::guess_format(&buf).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn thumbnail_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 400, 300);

        let mut first = Vec::new();
        let mut second = Vec::new();
        let backend = RustBackend::new();
        backend.thumbnail(&params(&source, 100), &mut first).unwrap();
        backend.thumbnail(&params(&source, 100), &mut second).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn thumbnail_with_sharpening() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 400, 300);

        let mut buf = Vec::new();
        let dims = RustBackend::new()
            .thumbnail(
                &ThumbnailParams {
                    sharpening: Some(Sharpening::light()),
                    ..params(&source, 100)
                },
                &mut buf,
            )
            .unwrap();

        assert_eq!(dims, Dimensions { width: 100, height: 75 });
        assert!(!buf.is_empty());
    }

    #[test]
    fn corrupt_source_is_a_decode_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("broken.jpg");
        std::fs::write(&source, b"\xFF\xD8\xFF\xE0 definitely not a jpeg").unwrap();

        let mut buf = Vec::new();
        let result = RustBackend::new().thumbnail(&params(&source, 230), &mut buf);

        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let mut buf = Vec::new();
        let result = RustBackend::new().thumbnail(
            &params(Path::new("/nonexistent/image.jpg"), 230),
            &mut buf,
        );

        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
