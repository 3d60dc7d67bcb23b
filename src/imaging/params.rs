//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! [`operations`](super::operations), which decides where a thumbnail goes,
//! and the [`backend`](super::backend), which does the pixel work. Keeping
//! them separate lets tests swap in a mock backend without touching the
//! atomic-write logic.
//!
//! - [`Quality`]: JPEG quality (1–100, default 85). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters applied after downscaling.
//! - [`ThumbnailParams`]: Source, bounding box, quality, optional sharpening.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for small thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// Parameters for a thumbnail operation: scale the source to fit inside the
/// `max_width × max_height` box, aspect ratio preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}
