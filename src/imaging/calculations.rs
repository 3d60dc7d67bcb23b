//! Pure calculation functions for thumbnail dimensions.
//!
//! Integer arithmetic only, so the same source always yields the same output
//! size regardless of platform float behaviour.

/// Scale `source` to fit inside `bounds`, preserving aspect ratio.
///
/// The edge that hits the box first matches it exactly; the other edge is
/// rounded to the nearest pixel (halves round up) and never drops below 1.
/// Sources smaller than the box are scaled up so thumbnails in a gallery
/// share one bounding size.
///
/// # Examples
/// ```
/// # use lk::imaging::calculate_fit_dimensions;
/// assert_eq!(calculate_fit_dimensions((4000, 3000), (200, 200)), (200, 150));
/// assert_eq!(calculate_fit_dimensions((3000, 4000), (200, 200)), (150, 200));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (u64::from(source.0.max(1)), u64::from(source.1.max(1)));
    let (max_w, max_h) = (u64::from(bounds.0.max(1)), u64::from(bounds.1.max(1)));

    // Compare src_w / src_h against max_w / max_h without dividing.
    let (w, h) = if src_w * max_h >= src_h * max_w {
        // Wider than the box: width is the binding edge
        (max_w, scale_rounded(src_h, max_w, src_w))
    } else {
        (scale_rounded(src_w, max_h, src_h), max_h)
    };

    (w.clamp(1, max_w) as u32, h.clamp(1, max_h) as u32)
}

/// `value * num / den`, rounded half up.
fn scale_rounded(value: u64, num: u64, den: u64) -> u64 {
    (2 * value * num + den) / (2 * den)
}
