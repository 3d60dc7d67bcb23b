//! Thumbnail generation in pure Rust, no system image libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG) |
//! | **Fit** | integer aspect-ratio math in [`calculate_fit_dimensions`] |
//! | **Resize** | Lanczos3 + optional `unsharpen` |
//! | **Encode** | `JpegEncoder`, written to a temp file then renamed |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`create_thumbnail`], the atomic-write wrapper around a backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_fit_dimensions;
pub use operations::{ThumbnailConfig, create_thumbnail};
pub use params::{Quality, Sharpening, ThumbnailParams};
pub use rust_backend::{RustBackend, is_supported_image};
