//! Selection of the largest capture format that matches a requested aspect ratio

use log::{debug, info, trace};
use serde::Serialize;

use crate::device::CaptureDevice;
use crate::format::{AspectRatioRequest, CaptureFormat, ResolutionTier, SubtypeTag};
use crate::ratio_math::{format_matches_aspect_ratio, DimensionsConverter, DEFAULT_RATIO_TOLERANCE};

/// A format chosen for an aspect ratio request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AspectRatioMatch {
    pub format: CaptureFormat,
    /// Ratio the caller asked for.
    pub requested_ratio: AspectRatioRequest,
    /// Ratio the format actually satisfies; differs from `requested_ratio`
    /// only when the square request fell back to 4:3.
    pub matched_ratio: AspectRatioRequest,
    pub fell_back: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AspectRatioSelector {
    tolerance: f64,
}

impl Default for AspectRatioSelector {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_RATIO_TOLERANCE,
        }
    }
}

impl AspectRatioSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Finds the highest resolution format matching `requested_ratio` whose
    /// pixel count reaches the floor of `tier`.
    ///
    /// Equal pixel counts prefer `preferred_subtype`, then input order. A 1:1
    /// request with no square format is retried once as 4:3. `None` means the
    /// caller should keep its current format.
    pub fn select(
        &self,
        formats: &[CaptureFormat],
        requested_ratio: AspectRatioRequest,
        tier: ResolutionTier,
        preferred_subtype: SubtypeTag,
        dimensions_of: DimensionsConverter<'_>,
    ) -> Option<AspectRatioMatch> {
        let mut ratio = requested_ratio;
        loop {
            let found =
                self.select_for_ratio(formats, ratio, tier, preferred_subtype, dimensions_of);
            if let Some(format) = found {
                return Some(AspectRatioMatch {
                    format: format.clone(),
                    requested_ratio,
                    matched_ratio: ratio,
                    fell_back: ratio != requested_ratio,
                });
            }

            // Only one hop is defined: square falls back to 4:3, nothing else falls back.
            if ratio != AspectRatioRequest::Ratio1x1 {
                return None;
            }
            info!("1:1 aspect ratio is not offered by this device; falling back to 4:3.");
            ratio = AspectRatioRequest::Ratio4x3;
        }
    }

    fn select_for_ratio<'a>(
        &self,
        formats: &'a [CaptureFormat],
        ratio: AspectRatioRequest,
        tier: ResolutionTier,
        preferred_subtype: SubtypeTag,
        dimensions_of: DimensionsConverter<'_>,
    ) -> Option<&'a CaptureFormat> {
        let target_ratio = ratio.target_ratio()?;
        let min_pixel_count = tier.min_pixel_count();

        let mut best_format: Option<&CaptureFormat> = None;
        let mut best_pixel_count = 0u64;
        let mut is_best_subtype_preferred = false;

        for format in formats {
            if !format_matches_aspect_ratio(format, target_ratio, dimensions_of, self.tolerance) {
                trace!("Skipping {}: aspect ratio is not {}", format, ratio);
                continue;
            }

            let pixel_count = dimensions_of(format).pixel_count();
            if tier != ResolutionTier::Max && pixel_count < min_pixel_count {
                trace!("Skipping {}: below the {} resolution floor", format, tier);
                continue;
            }

            let is_subtype_preferred = format.subtype == preferred_subtype;
            if best_format.is_none()
                || pixel_count > best_pixel_count
                || (pixel_count == best_pixel_count
                    && is_subtype_preferred
                    && !is_best_subtype_preferred)
            {
                best_format = Some(format);
                best_pixel_count = pixel_count;
                is_best_subtype_preferred = is_subtype_preferred;
            }
        }

        if let Some(format) = best_format {
            debug!("Best {} format for preset {}: {}", ratio, tier, format);
        }
        best_format
    }
}

/// [`AspectRatioSelector::select`] with the default tolerance, returning only the format.
pub fn select_best_format(
    formats: &[CaptureFormat],
    requested_ratio: AspectRatioRequest,
    tier: ResolutionTier,
    preferred_subtype: SubtypeTag,
    dimensions_of: DimensionsConverter<'_>,
) -> Option<CaptureFormat> {
    AspectRatioSelector::default()
        .select(formats, requested_ratio, tier, preferred_subtype, dimensions_of)
        .map(|found| found.format)
}

/// Applies an aspect ratio request to a device.
///
/// The subtype of the device's active format is preferred. When a format is
/// found it becomes the active format; otherwise the device is left alone.
pub fn apply_aspect_ratio<D: CaptureDevice + ?Sized>(
    device: &mut D,
    selector: &AspectRatioSelector,
    requested_ratio: AspectRatioRequest,
    tier: ResolutionTier,
    dimensions_of: DimensionsConverter<'_>,
) -> Option<AspectRatioMatch> {
    let preferred_subtype = device.active_format().subtype;
    let found = selector.select(
        device.formats(),
        requested_ratio,
        tier,
        preferred_subtype,
        dimensions_of,
    )?;
    device.set_active_format(found.format.clone());
    Some(found)
}
