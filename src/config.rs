use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::format::{AspectRatioRequest, ResolutionTier};

pub const CONFIG_ENV_VAR: &str = "CAPTURE_FORMAT_SELECT_CONFIG";
const CONFIG_DIR_NAME: &str = "capture-format-select";
const CONFIG_FILE_NAME: &str = "capture-format-select.toml";

/// Selection defaults read from a TOML configuration file. Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub aspect_ratio: Option<AspectRatioRequest>,
    pub resolution_preset: Option<ResolutionTier>,
    pub frames_per_second: Option<f64>,
    pub ratio_tolerance: Option<f64>,
    pub formats_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Cli(PathBuf),
    Env(PathBuf),
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Cli(path) | ConfigSource::Env(path) | ConfigSource::Default(path) => path,
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut cfg: Config =
            toml::from_str(contents).map_err(|err| anyhow!("Invalid configuration: {}", err))?;
        if let Some(tolerance) = cfg.ratio_tolerance {
            if !(tolerance.is_finite() && tolerance > 0.0) {
                return Err(anyhow!(
                    "Invalid configuration: ratio_tolerance must be a positive number (got {})",
                    tolerance
                ));
            }
        }
        if let Some(fps) = cfg.frames_per_second {
            if !(fps.is_finite() && fps >= 0.0) {
                return Err(anyhow!(
                    "Invalid configuration: frames_per_second must be non-negative (got {})",
                    fps
                ));
            }
        }
        if let Some(path) = cfg.formats_file.take() {
            cfg.formats_file = Some(path).filter(|p| !p.as_os_str().is_empty());
        }
        Ok(cfg)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("Failed to read configuration file at {}", path.display())
        })?;
        let mut cfg = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;

        // Relative catalog paths are resolved against the config file's directory.
        if let Some(formats_file) = cfg.formats_file.as_mut() {
            if formats_file.is_relative() {
                if let Some(parent) = path.parent() {
                    *formats_file = parent.join(&*formats_file);
                }
            }
        }
        Ok(cfg)
    }
}

/// Loads the first configuration file found.
///
/// An explicit path must exist. Otherwise `CAPTURE_FORMAT_SELECT_CONFIG` and
/// the default locations are tried in order, skipping missing files.
pub fn load(path_override: Option<&Path>) -> Result<Option<(Config, ConfigSource)>> {
    if let Some(path) = path_override {
        let cfg = Config::from_file(path)?;
        return Ok(Some((cfg, ConfigSource::Cli(path.to_path_buf()))));
    }

    if let Some(env_path) = env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            let cfg = Config::from_file(&path)?;
            return Ok(Some((cfg, ConfigSource::Env(path))));
        }
    }

    for candidate in default_config_candidates() {
        if !candidate.exists() {
            continue;
        }
        let cfg = Config::from_file(&candidate)?;
        return Ok(Some((cfg, ConfigSource::Default(candidate))));
    }

    Ok(None)
}

fn default_config_candidates() -> Vec<PathBuf> {
    let non_empty_var = |name: &str| env::var_os(name).filter(|value| !value.is_empty());
    config_candidates(
        non_empty_var("XDG_CONFIG_HOME").map(PathBuf::from),
        non_empty_var("HOME").map(PathBuf::from),
        env::current_dir().ok(),
    )
}

/// Candidate config paths, most specific first, without duplicates.
fn config_candidates(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    current_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    let dot_config = home.as_ref().map(|dir| dir.join(".config"));
    let system_config_dir = Some(PathBuf::from("/etc"));

    let mut candidates: Vec<PathBuf> = Vec::new();
    let ordered = [
        xdg_config_home.map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml")),
        dot_config.map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml")),
        home.map(|dir| dir.join(CONFIG_FILE_NAME)),
        current_dir.map(|dir| dir.join(CONFIG_FILE_NAME)),
        system_config_dir.map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml")),
    ];
    for path in ordered.into_iter().flatten() {
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates
}
