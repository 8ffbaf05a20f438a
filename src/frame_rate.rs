//! Frame rate refinement among formats sharing the active resolution

use log::debug;
use serde::Serialize;

use crate::device::CaptureDevice;
use crate::format::{CaptureFormat, MediaSettings, SubtypeTag};
use crate::ratio_math::{best_frame_rate_for_format, DimensionsConverter};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameRateSelection {
    pub format: CaptureFormat,
    /// Rate the chosen format can actually run at, closest to the target.
    pub frame_rate: f64,
}

/// Finds the format with the same dimensions as `active_format` whose best
/// achievable frame rate is closest to `target_frame_rate` (missing target
/// counts as `0`).
///
/// The active format is the starting point and counts as subtype-preferred,
/// so it only loses to a strictly closer candidate or to an equally close one
/// when it is itself not of `preferred_subtype`. Remaining ties keep the
/// earlier choice.
pub fn select_best_format(
    formats: &[CaptureFormat],
    active_format: &CaptureFormat,
    target_frame_rate: Option<f64>,
    preferred_subtype: SubtypeTag,
    dimensions_of: DimensionsConverter<'_>,
) -> FrameRateSelection {
    let target_resolution = dimensions_of(active_format);
    let target_frame_rate = target_frame_rate.unwrap_or(0.0);

    let mut best_format = active_format;
    let mut best_frame_rate = best_frame_rate_for_format(best_format, target_frame_rate);
    let mut min_distance = (best_frame_rate - target_frame_rate).abs();
    let mut is_best_subtype_preferred = true;

    for format in formats {
        if dimensions_of(format) != target_resolution {
            continue;
        }

        let frame_rate = best_frame_rate_for_format(format, target_frame_rate);
        let distance = (frame_rate - target_frame_rate).abs();
        let is_subtype_preferred = format.subtype == preferred_subtype;

        if distance < min_distance
            || (distance == min_distance && is_subtype_preferred && !is_best_subtype_preferred)
        {
            best_format = format;
            best_frame_rate = frame_rate;
            min_distance = distance;
            is_best_subtype_preferred = is_subtype_preferred;
        }
    }

    debug!(
        "Best format at {} for {} fps: {} running at {} fps",
        target_resolution, target_frame_rate, best_format, best_frame_rate
    );

    FrameRateSelection {
        format: best_format.clone(),
        frame_rate: best_frame_rate,
    }
}

/// Runs [`select_best_format`] against the device's active format, then makes
/// the chosen format active and stores its achievable rate in `media_settings`.
pub fn apply_frame_rate<D: CaptureDevice + ?Sized>(
    device: &mut D,
    media_settings: &mut MediaSettings,
    dimensions_of: DimensionsConverter<'_>,
) -> FrameRateSelection {
    let active_format = device.active_format();
    let selection = select_best_format(
        device.formats(),
        active_format,
        media_settings.frames_per_second,
        active_format.subtype,
        dimensions_of,
    );
    device.set_active_format(selection.format.clone());
    media_settings.frames_per_second = Some(selection.frame_rate);
    selection
}
