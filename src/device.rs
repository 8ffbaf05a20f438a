//! Capture device provider seam

use anyhow::{bail, Result};
use log::debug;

use crate::format::CaptureFormat;

/// Source of the formats a camera offers and holder of the active one.
///
/// Implementations must return formats in a stable order for the duration
/// of a selection.
pub trait CaptureDevice {
    fn formats(&self) -> &[CaptureFormat];

    fn active_format(&self) -> &CaptureFormat;

    fn set_active_format(&mut self, format: CaptureFormat);
}

/// A device backed by a fixed list of formats, used by the CLI catalog and in tests.
#[derive(Clone, Debug, PartialEq)]
pub struct InMemoryDevice {
    formats: Vec<CaptureFormat>,
    active: CaptureFormat,
}

impl InMemoryDevice {
    pub fn new(formats: Vec<CaptureFormat>, active_index: usize) -> Result<Self> {
        let Some(active) = formats.get(active_index).cloned() else {
            bail!(
                "Active format index {} is out of range ({} formats available)",
                active_index,
                formats.len()
            );
        };
        Ok(Self { formats, active })
    }
}

impl CaptureDevice for InMemoryDevice {
    fn formats(&self) -> &[CaptureFormat] {
        &self.formats
    }

    fn active_format(&self) -> &CaptureFormat {
        &self.active
    }

    fn set_active_format(&mut self, format: CaptureFormat) {
        debug!("Active format set to {}", format);
        self.active = format;
    }
}
