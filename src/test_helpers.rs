//! Shared test utilities: synthetic JPEG fixtures and directory assertions.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let album = setup_album();
//! let sunset = album.path().join("trip/sunset.jpg");
//! assert!(sunset.exists());
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::Path;
use tempfile::TempDir;

/// Write a small valid JPEG with a gradient so encodes are not trivially flat.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// A served tree with one album:
///
/// ```text
/// <tmp>/
/// ├── .hidden.jpg
/// ├── README.txt
/// ├── cover.JPG
/// └── trip/
///     ├── sunset.jpg   (640x480)
///     ├── beach.jpeg   (300x400)
///     ├── broken.jpg   (not a JPEG)
///     ├── note.txt
///     └── day2/
/// ```
pub fn setup_album() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let trip = tmp.path().join("trip");
    std::fs::create_dir_all(trip.join("day2")).unwrap();

    write_test_jpeg(&trip.join("sunset.jpg"), 640, 480);
    write_test_jpeg(&trip.join("beach.jpeg"), 300, 400);
    std::fs::write(trip.join("broken.jpg"), b"\xFF\xD8\xFF\xE0 truncated").unwrap();
    std::fs::write(trip.join("note.txt"), "remember the sunscreen").unwrap();
    write_test_jpeg(&tmp.path().join("cover.JPG"), 120, 80);
    write_test_jpeg(&tmp.path().join(".hidden.jpg"), 10, 10);
    std::fs::write(tmp.path().join("README.txt"), "album").unwrap();
    tmp
}

/// Sorted names of everything directly inside `dir`. Empty if `dir` is missing.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
