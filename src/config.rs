use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CURRENCY: &str = "KES";

pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub currency: String,
    pub data_dir: PathBuf,
}

impl Config {
    /// Read `HOMEBUDGET_*` variables, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = var("HOMEBUDGET_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(anyhow!(
                "HOMEBUDGET_API_URL must start with http:// or https://, got '{api_url}'"
            ));
        }

        let timeout_ms = match var("HOMEBUDGET_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| {
                    anyhow!("HOMEBUDGET_TIMEOUT_MS must be a positive number, got '{raw}'")
                })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let currency = var("HOMEBUDGET_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.into());

        let data_dir = match var("HOMEBUDGET_DATA_DIR") {
            Some(dir) => PathBuf::from(crate::export::expand_home(&dir)),
            None => default_data_dir()?,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(timeout_ms),
            currency,
            data_dir,
        })
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                self.data_dir.display()
            )
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "homebudget", "HomeBudget")
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
