//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale factor that brings the longer edge down to `max_dim`.
///
/// Capped at 1.0: images are never upscaled.
pub fn scale_factor(original: (u32, u32), max_dim: u32) -> f64 {
    let longer_edge = original.0.max(original.1);
    if longer_edge == 0 {
        return 1.0;
    }
    (max_dim as f64 / longer_edge as f64).min(1.0)
}

/// Dimensions after fitting `original` inside a `max_dim` × `max_dim` box.
///
/// Returns `None` when the image already fits (scale ≥ 1), which callers
/// treat as "leave the file alone". Both edges are rounded and never drop
/// below 1 px.
///
/// # Examples
/// ```
/// # use mediadrop::imaging::fit_within;
/// assert_eq!(fit_within((3000, 2000), 2048), Some((2048, 1365)));
/// assert_eq!(fit_within((800, 600), 2048), None);
/// ```
pub fn fit_within(original: (u32, u32), max_dim: u32) -> Option<(u32, u32)> {
    let scale = scale_factor(original, max_dim);
    if scale >= 1.0 {
        return None;
    }
    let (w, h) = original;
    let scaled = |edge: u32| ((edge as f64 * scale).round() as u32).max(1);
    Some((scaled(w), scaled(h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_scaled_to_longer_edge() {
        // 3000x2000, scale 2048/3000 → 2048 x 1365.33 → 1365
        assert_eq!(fit_within((3000, 2000), 2048), Some((2048, 1365)));
    }

    #[test]
    fn portrait_scaled_to_longer_edge() {
        assert_eq!(fit_within((2000, 3000), 2048), Some((1365, 2048)));
    }

    #[test]
    fn square_scaled() {
        assert_eq!(fit_within((4096, 4096), 2048), Some((2048, 2048)));
    }

    #[test]
    fn within_bounds_is_none() {
        assert_eq!(fit_within((2048, 1000), 2048), None);
        assert_eq!(fit_within((640, 480), 2048), None);
    }

    #[test]
    fn one_pixel_over_bounds_scales() {
        assert_eq!(fit_within((2049, 1), 2048), Some((2048, 1)));
    }

    #[test]
    fn extreme_aspect_never_collapses_to_zero() {
        // 10000x3 → scale 0.2048 → 0.6 → rounds to 1
        assert_eq!(fit_within((10000, 3), 2048), Some((2048, 1)));
        assert_eq!(fit_within((10000, 1), 100), Some((100, 1)));
    }

    #[test]
    fn scale_never_upscales() {
        assert_eq!(scale_factor((100, 50), 2048), 1.0);
        assert_eq!(scale_factor((4000, 2000), 2000), 0.5);
    }

    #[test]
    fn zero_sized_input_is_left_alone() {
        assert_eq!(scale_factor((0, 0), 2048), 1.0);
        assert_eq!(fit_within((0, 0), 2048), None);
    }
}
