//! Numeric helpers shared by the aspect ratio and frame rate selectors

use crate::format::{CaptureFormat, Dimensions, FrameRateRange};

/// Maximum difference at which two aspect ratios are still considered equal.
pub const DEFAULT_RATIO_TOLERANCE: f64 = 0.01;

/// Extracts pixel dimensions from a format. Injected so tests and callers
/// with their own notion of a format's size can substitute it.
pub type DimensionsConverter<'a> = &'a dyn Fn(&CaptureFormat) -> Dimensions;

/// Width over height; `0.0` for a zero height.
pub fn aspect_ratio(dimensions: Dimensions) -> f64 {
    if dimensions.height == 0 {
        return 0.0;
    }
    f64::from(dimensions.width) / f64::from(dimensions.height)
}

pub fn ratios_match(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

pub fn format_matches_aspect_ratio(
    format: &CaptureFormat,
    target_ratio: f64,
    dimensions_of: DimensionsConverter<'_>,
    tolerance: f64,
) -> bool {
    ratios_match(aspect_ratio(dimensions_of(format)), target_ratio, tolerance)
}

/// Clamps `target` into the range.
pub fn achievable_frame_rate(range: &FrameRateRange, target: f64) -> f64 {
    target.max(range.min).min(range.max)
}

/// The frame rate supported by `format` that is closest to `target`.
///
/// Ranges are scanned in order and the first closest one wins. A format
/// without any ranges reports `0.0`.
pub fn best_frame_rate_for_format(format: &CaptureFormat, target: f64) -> f64 {
    let mut best_frame_rate = 0.0;
    let mut min_distance = f64::MAX;

    for range in &format.frame_rate_ranges {
        let frame_rate = achievable_frame_rate(range, target);
        let distance = (frame_rate - target).abs();
        if distance < min_distance {
            best_frame_rate = frame_rate;
            min_distance = distance;
        }
    }

    best_frame_rate
}
