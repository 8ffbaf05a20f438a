//! Capture format selection for cameras.
//!
//! Given the formats a capture device lists, [`aspect_ratio`] picks the
//! largest one matching an aspect ratio and resolution preset, and
//! [`frame_rate`] then picks, among formats of that resolution, the one
//! that can run closest to a requested frame rate.

pub mod aspect_ratio;
pub mod catalog;
pub mod config;
pub mod device;
pub mod format;
pub mod frame_rate;
pub mod logging;
pub mod ratio_math;

pub use aspect_ratio::{apply_aspect_ratio, AspectRatioMatch, AspectRatioSelector};
pub use device::{CaptureDevice, InMemoryDevice};
pub use format::{
    AspectRatioRequest, CaptureFormat, Dimensions, FrameRateRange, MediaSettings, ResolutionTier,
    SubtypeTag,
};
pub use frame_rate::{apply_frame_rate, FrameRateSelection};
pub use ratio_math::{DimensionsConverter, DEFAULT_RATIO_TOLERANCE};
