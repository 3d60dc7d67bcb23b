//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between "where does the thumbnail
//! go" ([`operations`](super::operations)) and "how are pixels produced". The
//! production implementation is [`RustBackend`](super::rust_backend::RustBackend).
//! Backends encode into a writer rather than a path so the caller owns file
//! placement (temp file + rename).

use super::params::ThumbnailParams;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations must be deterministic: the same source and parameters
/// produce the same bytes. Concurrent generators racing on one cache path
/// rely on that.
pub trait ImageBackend: Send + Sync {
    /// Decode `params.source`, scale it into the bounding box and write the
    /// JPEG encoding to `out`. Returns the dimensions written.
    fn thumbnail(
        &self,
        params: &ThumbnailParams,
        out: &mut dyn Write,
    ) -> Result<Dimensions, BackendError>;
}
