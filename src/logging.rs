use log::{debug, log_enabled, Level};
use std::env;

use crate::device::CaptureDevice;

/// Installs the stderr logger, defaulting `RUST_LOG` to `info` when unset.
pub fn init() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}

fn format_lines<D: CaptureDevice + ?Sized>(device: &D) -> Vec<String> {
    let active = device.active_format();
    device
        .formats()
        .iter()
        .enumerate()
        .map(|(idx, format)| {
            let marker = if format == active { "*" } else { " " };
            format!("{} [{:>2}] {}", marker, idx, format)
        })
        .collect()
}

pub fn log_device_formats<D: CaptureDevice + ?Sized>(device: &D) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    let lines = format_lines(device);
    debug!("Device offers {} formats (* = active):", lines.len());
    for line in lines {
        debug!("  {}", line);
    }
}
