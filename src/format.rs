//! Capture formats and the selection constraints applied to them

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::EnumIter;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Inclusive range of frame rates a format can be driven at.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRateRange {
    pub min: f64,
    pub max: f64,
}

impl FrameRateRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl fmt::Display for FrameRateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} fps", self.min, self.max)
    }
}

/// Media subtype of a format, packed as a big-endian FourCC (`'420v'`, `'avc1'`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SubtypeRepr", into = "SubtypeRepr")]
pub struct SubtypeTag(pub u32);

impl SubtypeTag {
    pub const fn from_fourcc(code: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(code))
    }

    pub const fn fourcc(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    fn is_printable(&self) -> bool {
        self.fourcc().iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

impl FromStr for SubtypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches('\'');
        if let Some(hex) = trimmed.strip_prefix("0x") {
            return u32::from_str_radix(hex, 16)
                .map(SubtypeTag)
                .map_err(|e| format!("Invalid hex subtype '{}': {}", s, e));
        }
        let bytes: [u8; 4] = trimmed.as_bytes().try_into().map_err(|_| {
            format!(
                "Invalid subtype '{}': expected a 4-character code such as '420v'",
                s
            )
        })?;
        if !bytes.iter().all(u8::is_ascii) {
            return Err(format!("Invalid subtype '{}': code must be ASCII", s));
        }
        Ok(SubtypeTag::from_fourcc(bytes))
    }
}

impl fmt::Display for SubtypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_printable() {
            let code = self.fourcc();
            write!(f, "{}", String::from_utf8_lossy(&code))
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum SubtypeRepr {
    Code(u32),
    Text(String),
}

impl TryFrom<SubtypeRepr> for SubtypeTag {
    type Error = String;

    fn try_from(value: SubtypeRepr) -> Result<Self, Self::Error> {
        match value {
            SubtypeRepr::Code(code) => Ok(SubtypeTag(code)),
            SubtypeRepr::Text(text) => text.parse(),
        }
    }
}

impl From<SubtypeTag> for SubtypeRepr {
    fn from(tag: SubtypeTag) -> Self {
        if tag.is_printable() {
            SubtypeRepr::Text(tag.to_string())
        } else {
            SubtypeRepr::Code(tag.0)
        }
    }
}

/// Immutable snapshot of one format a capture device offers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureFormat {
    #[serde(flatten)]
    pub dimensions: Dimensions,
    pub subtype: SubtypeTag,
    #[serde(default)]
    pub frame_rate_ranges: Vec<FrameRateRange>,
}

impl CaptureFormat {
    pub fn new(
        dimensions: Dimensions,
        subtype: SubtypeTag,
        frame_rate_ranges: impl Into<Vec<FrameRateRange>>,
    ) -> Self {
        Self {
            dimensions,
            subtype,
            frame_rate_ranges: frame_rate_ranges.into(),
        }
    }

    /// Default dimensions extractor; reads the snapshot's own dimensions.
    pub fn dimensions_of(format: &CaptureFormat) -> Dimensions {
        format.dimensions
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.dimensions, self.subtype)?;
        if self.frame_rate_ranges.is_empty() {
            return write!(f, " (no frame rate ranges)");
        }
        let ranges = self
            .frame_rate_ranges
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, " [{}]", ranges)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize, EnumIter)]
pub enum AspectRatioRequest {
    /// Widescreen 16:9.
    #[value(name = "16x9", alias = "16:9", alias = "widescreen")]
    #[serde(rename = "16x9", alias = "16:9", alias = "widescreen")]
    Ratio16x9,
    /// Standard 4:3.
    #[value(name = "4x3", alias = "4:3", alias = "standard")]
    #[serde(rename = "4x3", alias = "4:3", alias = "standard")]
    Ratio4x3,
    /// Square 1:1 (falls back to 4:3 when no square format exists).
    #[value(name = "1x1", alias = "1:1", alias = "square")]
    #[serde(rename = "1x1", alias = "1:1", alias = "square")]
    Ratio1x1,
    /// No aspect ratio constraint; keep the current format.
    #[value(name = "default", alias = "none", alias = "any")]
    #[serde(rename = "default", alias = "none", alias = "any")]
    Default,
}

impl AspectRatioRequest {
    /// Numeric width/height target, or `None` for [`AspectRatioRequest::Default`].
    pub fn target_ratio(self) -> Option<f64> {
        match self {
            AspectRatioRequest::Ratio16x9 => Some(16.0 / 9.0),
            AspectRatioRequest::Ratio4x3 => Some(4.0 / 3.0),
            AspectRatioRequest::Ratio1x1 => Some(1.0),
            AspectRatioRequest::Default => None,
        }
    }
}

impl fmt::Display for AspectRatioRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AspectRatioRequest::Ratio16x9 => "16x9",
            AspectRatioRequest::Ratio4x3 => "4x3",
            AspectRatioRequest::Ratio1x1 => "1x1",
            AspectRatioRequest::Default => "default",
        };
        write!(f, "{}", label)
    }
}

/// Resolution preset; each tier sets a minimum pixel count a format must reach.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionTier {
    /// CIF, 352x288.
    #[serde(alias = "cif")]
    Low,
    /// VGA, 640x480.
    #[serde(alias = "vga")]
    Medium,
    /// 720p, 1280x720.
    #[value(alias = "720p")]
    #[serde(alias = "720p")]
    High,
    /// 1080p, 1920x1080.
    #[value(alias = "1080p")]
    #[serde(alias = "1080p", alias = "very_high")]
    VeryHigh,
    /// 4K, 3840x2160.
    #[value(alias = "4k", alias = "2160p")]
    #[serde(alias = "4k", alias = "2160p", alias = "ultra_high")]
    UltraHigh,
    /// Any resolution.
    Max,
}

impl ResolutionTier {
    pub fn floor_dimensions(self) -> Option<Dimensions> {
        match self {
            ResolutionTier::Low => Some(Dimensions::new(352, 288)),
            ResolutionTier::Medium => Some(Dimensions::new(640, 480)),
            ResolutionTier::High => Some(Dimensions::new(1280, 720)),
            ResolutionTier::VeryHigh => Some(Dimensions::new(1920, 1080)),
            ResolutionTier::UltraHigh => Some(Dimensions::new(3840, 2160)),
            ResolutionTier::Max => None,
        }
    }

    /// Minimum pixel count; `0` for [`ResolutionTier::Max`].
    pub fn min_pixel_count(self) -> u64 {
        self.floor_dimensions()
            .map(|d| d.pixel_count())
            .unwrap_or(0)
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolutionTier::Low => "low",
            ResolutionTier::Medium => "medium",
            ResolutionTier::High => "high",
            ResolutionTier::VeryHigh => "very-high",
            ResolutionTier::UltraHigh => "ultra-high",
            ResolutionTier::Max => "max",
        };
        write!(f, "{}", label)
    }
}

/// Caller-owned capture settings. The frame-rate selection overwrites
/// `frames_per_second` with the rate the chosen format can actually run at.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaSettings {
    pub frames_per_second: Option<f64>,
}

impl MediaSettings {
    pub const fn with_frames_per_second(frames_per_second: f64) -> Self {
        Self {
            frames_per_second: Some(frames_per_second),
        }
    }
}
