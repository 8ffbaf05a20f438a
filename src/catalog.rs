//! Format catalog files describing a capture device offline

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::device::InMemoryDevice;
use crate::format::CaptureFormat;

/// Contents of a catalog file: the formats a device lists, in listing order,
/// and which of them is currently active.
#[derive(Clone, Debug, Deserialize)]
pub struct FormatCatalog {
    #[serde(default)]
    pub active: usize,
    #[serde(default)]
    pub formats: Vec<CaptureFormat>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum CatalogSyntax {
    Toml,
    Json,
}

impl CatalogSyntax {
    fn for_path(path: &Path) -> CatalogSyntax {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => CatalogSyntax::Json,
            _ => CatalogSyntax::Toml,
        }
    }
}

impl FormatCatalog {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let catalog: FormatCatalog =
            toml::from_str(contents).map_err(|err| anyhow!("Invalid TOML catalog: {}", err))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let catalog: FormatCatalog = serde_json::from_str(contents)
            .map_err(|err| anyhow!("Invalid JSON catalog: {}", err))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads a catalog; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read format catalog at {}", path.display()))?;

        let catalog = match CatalogSyntax::for_path(path) {
            CatalogSyntax::Json => Self::from_json_str(&contents),
            CatalogSyntax::Toml => Self::from_toml_str(&contents),
        }
        .with_context(|| format!("Failed to load format catalog {}", path.display()))?;

        info!(
            "Loaded {} capture formats from {}",
            catalog.formats.len(),
            path.display()
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            bail!("Catalog lists no formats");
        }
        if self.active >= self.formats.len() {
            bail!(
                "Active format index {} is out of range ({} formats listed)",
                self.active,
                self.formats.len()
            );
        }
        for (idx, format) in self.formats.iter().enumerate() {
            for range in &format.frame_rate_ranges {
                if !(range.min.is_finite() && range.max.is_finite()) {
                    bail!("Format {} ({}) has a non-finite frame rate range", idx, format);
                }
                if range.min < 0.0 || range.min > range.max {
                    bail!(
                        "Format {} ({}) has an invalid frame rate range {}..{}: \
                         expected 0 <= min <= max",
                        idx,
                        format,
                        range.min,
                        range.max
                    );
                }
            }
        }
        Ok(())
    }

    pub fn into_device(self) -> Result<InMemoryDevice> {
        InMemoryDevice::new(self.formats, self.active)
    }
}
