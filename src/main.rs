use anyhow::{bail, Result};
use clap::parser::ValueSource;
use clap::{value_parser, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use strum::IntoEnumIterator;

use capture_format_select::catalog::FormatCatalog;
use capture_format_select::config::{self, ConfigSource};
use capture_format_select::logging;
use capture_format_select::ratio_math::DEFAULT_RATIO_TOLERANCE;
use capture_format_select::{
    apply_aspect_ratio, apply_frame_rate, AspectRatioMatch, AspectRatioRequest,
    AspectRatioSelector, CaptureDevice, CaptureFormat, MediaSettings, ResolutionTier,
};

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Format catalog (TOML, or JSON by extension) listing the device's capture formats
    #[arg(short, long, value_parser = value_parser!(PathBuf), id = "formats")]
    formats: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long, value_parser = value_parser!(PathBuf))]
    config_file: Option<PathBuf>,

    /// Requested aspect ratio ("default" keeps the active format)
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = AspectRatioRequest::Default,
        id = "aspect_ratio"
    )]
    aspect_ratio: AspectRatioRequest,

    /// Resolution preset setting the minimum pixel count of the chosen format
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = ResolutionTier::Max,
        id = "resolution_preset"
    )]
    resolution_preset: ResolutionTier,

    /// Target frame rate (defaults to the lowest rate the format supports)
    #[arg(long, value_parser = Args::parse_frame_rate, id = "fps")]
    fps: Option<f64>,

    /// Maximum aspect ratio difference still treated as a match
    #[arg(
        long,
        value_parser = Args::parse_tolerance,
        default_value_t = DEFAULT_RATIO_TOLERANCE,
        id = "tolerance"
    )]
    tolerance: f64,

    /// Output format for the selection report: text|json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Print the known aspect ratios and resolution presets and exit
    #[arg(long, default_value_t = false)]
    list_presets: bool,
}

impl Args {
    fn parse_frame_rate(input: &str) -> Result<f64, String> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        let numeric = lower.strip_suffix("fps").unwrap_or(&lower).trim();
        if numeric.is_empty() {
            return Err("Frame rate value cannot be empty".to_string());
        }

        // Accept NTSC style fractions such as 30000/1001.
        let value = match numeric.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.trim().parse().map_err(|_| {
                    format!("Failed to parse frame rate '{}': invalid numerator", input)
                })?;
                let den: f64 = den.trim().parse().map_err(|_| {
                    format!("Failed to parse frame rate '{}': invalid denominator", input)
                })?;
                if den == 0.0 {
                    return Err(format!(
                        "Failed to parse frame rate '{}': denominator cannot be zero",
                        input
                    ));
                }
                num / den
            }
            None => numeric
                .parse()
                .map_err(|_| format!("Failed to parse frame rate '{}': invalid number", input))?,
        };

        if !value.is_finite() || value < 0.0 {
            return Err(format!(
                "Failed to parse frame rate '{}': value must be a non-negative number",
                input
            ));
        }
        Ok(value)
    }

    fn parse_tolerance(input: &str) -> Result<f64, String> {
        let value: f64 = input
            .trim()
            .parse()
            .map_err(|_| format!("Failed to parse tolerance '{}': invalid number", input))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(format!(
                "Failed to parse tolerance '{}': value must be positive",
                input
            ));
        }
        Ok(value)
    }
}

fn cli_value_provided(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|src| matches!(src, ValueSource::CommandLine))
}

fn apply_config_overrides(args: &mut Args, cfg: &config::Config, matches: &ArgMatches) {
    if args.formats.is_none() {
        if let Some(path) = cfg.formats_file.as_ref() {
            args.formats = Some(path.clone());
        }
    }

    if !cli_value_provided(matches, "aspect_ratio") {
        if let Some(aspect_ratio) = cfg.aspect_ratio {
            args.aspect_ratio = aspect_ratio;
        }
    }

    if !cli_value_provided(matches, "resolution_preset") {
        if let Some(preset) = cfg.resolution_preset {
            args.resolution_preset = preset;
        }
    }

    if args.fps.is_none() && !cli_value_provided(matches, "fps") {
        args.fps = cfg.frames_per_second;
    }

    if !cli_value_provided(matches, "tolerance") {
        if let Some(tolerance) = cfg.ratio_tolerance {
            args.tolerance = tolerance;
        }
    }
}

#[derive(Serialize)]
struct SelectionReport {
    aspect_ratio: AspectRatioRequest,
    resolution_preset: ResolutionTier,
    requested_frames_per_second: Option<f64>,
    /// `None` when the aspect ratio step left the active format unchanged.
    aspect_ratio_match: Option<AspectRatioMatch>,
    format: CaptureFormat,
    frames_per_second: f64,
}

fn run_selection<D: CaptureDevice + ?Sized>(device: &mut D, args: &Args) -> SelectionReport {
    let selector = AspectRatioSelector::with_tolerance(args.tolerance);
    let aspect_ratio_match = apply_aspect_ratio(
        device,
        &selector,
        args.aspect_ratio,
        args.resolution_preset,
        &CaptureFormat::dimensions_of,
    );
    match &aspect_ratio_match {
        Some(found) if found.fell_back => info!(
            "Selected {} ({} requested, {} used)",
            found.format, found.requested_ratio, found.matched_ratio
        ),
        Some(found) => info!("Selected {} for {}", found.format, found.requested_ratio),
        None if args.aspect_ratio == AspectRatioRequest::Default => {}
        None => warn!(
            "No {} format at preset {}; keeping {}",
            args.aspect_ratio,
            args.resolution_preset,
            device.active_format()
        ),
    }

    let mut media_settings = MediaSettings {
        frames_per_second: args.fps,
    };
    let selection = apply_frame_rate(device, &mut media_settings, &CaptureFormat::dimensions_of);

    SelectionReport {
        aspect_ratio: args.aspect_ratio,
        resolution_preset: args.resolution_preset,
        requested_frames_per_second: args.fps,
        aspect_ratio_match,
        format: selection.format,
        frames_per_second: media_settings.frames_per_second.unwrap_or(selection.frame_rate),
    }
}

fn describe_requested_rate(fps: Option<f64>) -> String {
    match fps {
        Some(fps) => format!("{} fps", fps),
        None => "unset".to_string(),
    }
}

fn render_text(report: &SelectionReport) -> String {
    let mut lines = Vec::new();
    match &report.aspect_ratio_match {
        Some(found) if found.fell_back => lines.push(format!(
            "Aspect ratio: {} unavailable, fell back to {} (preset {})",
            found.requested_ratio, found.matched_ratio, report.resolution_preset
        )),
        Some(found) => lines.push(format!(
            "Aspect ratio: {} (preset {})",
            found.matched_ratio, report.resolution_preset
        )),
        None if report.aspect_ratio == AspectRatioRequest::Default => {
            lines.push("Aspect ratio: default (active format kept)".to_string())
        }
        None => lines.push(format!(
            "Aspect ratio: no {} format at preset {} (active format kept)",
            report.aspect_ratio, report.resolution_preset
        )),
    }
    lines.push(format!("Format: {}", report.format));
    lines.push(format!(
        "Frame rate: {} fps (requested {})",
        report.frames_per_second,
        describe_requested_rate(report.requested_frames_per_second)
    ));
    lines.join("\n")
}

#[derive(Serialize)]
struct PresetListing {
    aspect_ratios: Vec<AspectRatioEntry>,
    resolution_presets: Vec<ResolutionPresetEntry>,
}

#[derive(Serialize)]
struct AspectRatioEntry {
    name: AspectRatioRequest,
    ratio: Option<f64>,
}

#[derive(Serialize)]
struct ResolutionPresetEntry {
    name: ResolutionTier,
    min_width: Option<u32>,
    min_height: Option<u32>,
    min_pixel_count: u64,
}

fn preset_listing() -> PresetListing {
    PresetListing {
        aspect_ratios: AspectRatioRequest::iter()
            .map(|name| AspectRatioEntry {
                name,
                ratio: name.target_ratio(),
            })
            .collect(),
        resolution_presets: ResolutionTier::iter()
            .map(|name| {
                let floor = name.floor_dimensions();
                ResolutionPresetEntry {
                    name,
                    min_width: floor.map(|d| d.width),
                    min_height: floor.map(|d| d.height),
                    min_pixel_count: name.min_pixel_count(),
                }
            })
            .collect(),
    }
}

fn print_presets(output: OutputFormat) -> Result<()> {
    let listing = preset_listing();
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        OutputFormat::Text => {
            println!("Aspect ratios:");
            for entry in &listing.aspect_ratios {
                match entry.ratio {
                    Some(ratio) => println!("  {:<8} {:.4}", entry.name.to_string(), ratio),
                    None => println!("  {:<8} no constraint", entry.name.to_string()),
                }
            }
            println!("Resolution presets:");
            for entry in &listing.resolution_presets {
                match (entry.min_width, entry.min_height) {
                    (Some(w), Some(h)) => println!(
                        "  {:<11} >= {}x{} ({} pixels)",
                        entry.name.to_string(),
                        w,
                        h,
                        entry.min_pixel_count
                    ),
                    _ => println!("  {:<11} any resolution", entry.name.to_string()),
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    logging::init();

    let matches = Args::command().get_matches();
    let mut args = Args::from_arg_matches(&matches)?;

    if args.list_presets {
        return print_presets(args.output);
    }

    let loaded_config = config::load(args.config_file.as_deref())?;
    if let Some((cfg, source)) = &loaded_config {
        match source {
            ConfigSource::Env(path) => info!(
                "Loaded configuration from '{}' (via {}).",
                path.display(),
                config::CONFIG_ENV_VAR
            ),
            ConfigSource::Cli(_) | ConfigSource::Default(_) => {
                info!("Loaded configuration from '{}'.", source.path().display())
            }
        }
        apply_config_overrides(&mut args, cfg, &matches);
    }

    let Some(formats_path) = args.formats.clone() else {
        bail!(
            "No format catalog given; pass --formats <FILE> or set formats_file in the config"
        );
    };
    let mut device = FormatCatalog::load(&formats_path)?.into_device()?;
    logging::log_device_formats(&device);

    let report = run_selection(&mut device, &args);
    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", render_text(&report)),
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use capture_format_select::{Dimensions, FrameRateRange, InMemoryDevice, SubtypeTag};

    fn parse(argv: &[&str]) -> (Args, ArgMatches) {
        let argv = std::iter::once("capture_format_select").chain(argv.iter().copied());
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        (args, matches)
    }

    fn device() -> InMemoryDevice {
        let yuv = SubtypeTag::from_fourcc(*b"420v");
        let format = |width, height, max| {
            CaptureFormat::new(
                Dimensions::new(width, height),
                yuv,
                vec![FrameRateRange::new(1.0, max)],
            )
        };
        let formats = vec![
            format(640, 480, 30.0),
            format(1920, 1080, 30.0),
            format(1920, 1080, 60.0),
            format(2592, 1944, 15.0),
        ];
        InMemoryDevice::new(formats, 0).unwrap()
    }

    #[test]
    fn frame_rate_parser_accepts_plain_suffixed_and_fractional_values() {
        assert_eq!(Args::parse_frame_rate("30").unwrap(), 30.0);
        assert_eq!(Args::parse_frame_rate(" 60fps ").unwrap(), 60.0);
        let ntsc = Args::parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn frame_rate_parser_rejects_bad_input() {
        assert!(Args::parse_frame_rate("").is_err());
        assert!(Args::parse_frame_rate("fast").is_err());
        assert!(Args::parse_frame_rate("30/0").is_err());
        assert!(Args::parse_frame_rate("-5").is_err());
    }

    #[test]
    fn tolerance_parser_requires_positive_value() {
        assert_eq!(Args::parse_tolerance("0.05").unwrap(), 0.05);
        assert!(Args::parse_tolerance("0").is_err());
        assert!(Args::parse_tolerance("nope").is_err());
    }

    #[test]
    fn config_fills_values_not_given_on_command_line() {
        let (mut args, matches) = parse(&["--aspect-ratio", "4x3"]);
        let cfg = config::Config {
            aspect_ratio: Some(AspectRatioRequest::Ratio16x9),
            resolution_preset: Some(ResolutionTier::High),
            frames_per_second: Some(24.0),
            ratio_tolerance: Some(0.05),
            formats_file: Some(PathBuf::from("cams.toml")),
        };
        apply_config_overrides(&mut args, &cfg, &matches);
        assert_eq!(args.aspect_ratio, AspectRatioRequest::Ratio4x3);
        assert_eq!(args.resolution_preset, ResolutionTier::High);
        assert_eq!(args.fps, Some(24.0));
        assert_eq!(args.tolerance, 0.05);
        assert_eq!(args.formats, Some(PathBuf::from("cams.toml")));
    }

    #[test]
    fn explicit_flags_are_seen_as_command_line_values() {
        let (_, matches) = parse(&["-a", "4x3", "--tolerance", "0.02"]);
        assert!(cli_value_provided(&matches, "aspect_ratio"));
        assert!(cli_value_provided(&matches, "tolerance"));
        assert!(!cli_value_provided(&matches, "resolution_preset"));
        assert!(!cli_value_provided(&matches, "fps"));
    }

    #[test]
    fn explicit_default_valued_flags_still_beat_config() {
        let (mut args, matches) = parse(&["--aspect-ratio", "default", "-r", "max"]);
        let cfg = config::Config {
            aspect_ratio: Some(AspectRatioRequest::Ratio1x1),
            resolution_preset: Some(ResolutionTier::Low),
            ..config::Config::default()
        };
        apply_config_overrides(&mut args, &cfg, &matches);
        assert_eq!(args.aspect_ratio, AspectRatioRequest::Default);
        assert_eq!(args.resolution_preset, ResolutionTier::Max);
    }

    #[test]
    fn command_line_values_win_over_config() {
        let (mut args, matches) = parse(&[
            "--formats",
            "cli.toml",
            "--resolution-preset",
            "low",
            "--fps",
            "15",
            "--tolerance",
            "0.02",
        ]);
        let cfg = config::Config {
            aspect_ratio: None,
            resolution_preset: Some(ResolutionTier::UltraHigh),
            frames_per_second: Some(60.0),
            ratio_tolerance: Some(0.5),
            formats_file: Some(PathBuf::from("cfg.toml")),
        };
        apply_config_overrides(&mut args, &cfg, &matches);
        assert_eq!(args.aspect_ratio, AspectRatioRequest::Default);
        assert_eq!(args.resolution_preset, ResolutionTier::Low);
        assert_eq!(args.fps, Some(15.0));
        assert_eq!(args.tolerance, 0.02);
        assert_eq!(args.formats, Some(PathBuf::from("cli.toml")));
    }

    #[test]
    fn selection_runs_aspect_ratio_then_frame_rate() {
        let (args, _) = parse(&["-a", "16x9", "-r", "high", "--fps", "60"]);
        let mut device = device();
        let report = run_selection(&mut device, &args);
        assert!(report.aspect_ratio_match.is_some());
        assert_eq!(report.format.dimensions, Dimensions::new(1920, 1080));
        assert_eq!(report.frames_per_second, 60.0);
        assert_eq!(device.active_format(), &report.format);
    }

    #[test]
    fn missing_ratio_keeps_active_format_but_still_refines_rate() {
        let (args, _) = parse(&["-a", "16x9", "-r", "ultra-high", "--fps", "60"]);
        let mut device = device();
        let report = run_selection(&mut device, &args);
        assert!(report.aspect_ratio_match.is_none());
        assert_eq!(report.format.dimensions, Dimensions::new(640, 480));
        assert_eq!(report.frames_per_second, 30.0);
        assert!(render_text(&report).contains("no 16x9 format at preset ultra-high"));
    }

    #[test]
    fn square_request_reports_fallback() {
        let (args, _) = parse(&["-a", "1x1"]);
        let mut device = device();
        let report = run_selection(&mut device, &args);
        let found = report.aspect_ratio_match.as_ref().unwrap();
        assert!(found.fell_back);
        assert_eq!(report.format.dimensions, Dimensions::new(2592, 1944));
        assert!(render_text(&report).contains("1x1 unavailable, fell back to 4x3"));
    }

    #[test]
    fn preset_listing_covers_every_value() {
        let listing = preset_listing();
        assert_eq!(listing.aspect_ratios.len(), 4);
        assert_eq!(listing.resolution_presets.len(), 6);
        let max = listing.resolution_presets.last().unwrap();
        assert_eq!(max.name, ResolutionTier::Max);
        assert_eq!(max.min_pixel_count, 0);
    }
}
