#![allow(dead_code)]

use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Catalog of a typical phone back camera, active format 640x480.
pub const PHONE_CATALOG: &str = r#"
active = 1

[[formats]]
width = 352
height = 288
subtype = "420v"
frame_rate_ranges = [{ min = 1.0, max = 30.0 }]

[[formats]]
width = 640
height = 480
subtype = "420v"
frame_rate_ranges = [{ min = 1.0, max = 30.0 }]

[[formats]]
width = 1280
height = 720
subtype = "420v"
frame_rate_ranges = [{ min = 1.0, max = 30.0 }]

[[formats]]
width = 1280
height = 720
subtype = "420v"
frame_rate_ranges = [{ min = 1.0, max = 60.0 }]

[[formats]]
width = 1920
height = 1080
subtype = "420f"
frame_rate_ranges = [{ min = 1.0, max = 30.0 }]

[[formats]]
width = 1920
height = 1080
subtype = "420v"
frame_rate_ranges = [{ min = 1.0, max = 30.0 }]

[[formats]]
width = 1920
height = 1080
subtype = "420v"
frame_rate_ranges = [{ min = 1.0, max = 30.0 }, { min = 60.0, max = 60.0 }]

[[formats]]
width = 4032
height = 3024
subtype = "420v"
frame_rate_ranges = [{ min = 1.0, max = 30.0 }]
"#;

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write test file");
    path
}

pub fn write_phone_catalog(tmp: &TempDir) -> PathBuf {
    write_file(tmp.path(), "phone.toml", PHONE_CATALOG)
}

/// The binary with every configuration lookup pointed into `tmp`.
pub fn isolated_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("capture_format_select").expect("binary built");
    cmd.current_dir(tmp.path());
    cmd.env_remove("CAPTURE_FORMAT_SELECT_CONFIG");
    cmd.env_remove("XDG_CONFIG_HOME");
    cmd.env("HOME", tmp.path());
    cmd.env("RUST_LOG", "warn");
    cmd
}

pub fn run_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.arg("--output").arg("json").assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("selection report is valid JSON")
}
