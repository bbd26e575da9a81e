mod aggregate;
mod api;
mod config;
mod export;
mod logging;
mod models;
mod run;
mod session;
mod ui;

use anyhow::Result;

use crate::config::Config;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_env()?;
    config.ensure_data_dir()?;
    logging::init(&config.data_dir)?;
    tracing::debug!(api = %config.api_url, data_dir = %config.data_dir.display(), "config loaded");

    match args.len() {
        1 => run::as_tui(&config),
        2.. => run::as_cli(&args, &config),
        _ => {
            eprintln!("Usage: homebudget [command]");
            Ok(())
        }
    }
}
