use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE: &str = "homebudget.log";

/// Log to a file in the data directory; stdout belongs to the TUI.
///
/// The filter comes from `HOMEBUDGET_LOG`, then `RUST_LOG`, then `info`.
pub fn init(data_dir: &Path) -> Result<()> {
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to install the log subscriber")?;
    Ok(())
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env("HOMEBUDGET_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
