#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::time::Duration;

use super::*;

fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    // Keep the platform lookup out of the tests.
    vars.entry("HOMEBUDGET_DATA_DIR".into())
        .or_insert_with(|| "/tmp/homebudget-test".into());
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_defaults() {
    let config = config_from(&[]).unwrap();
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    assert_eq!(config.currency, "KES");
    assert_eq!(config.data_dir, PathBuf::from("/tmp/homebudget-test"));
}

#[test]
fn test_overrides() {
    let config = config_from(&[
        ("HOMEBUDGET_API_URL", "https://budget.example.com/api/"),
        ("HOMEBUDGET_TIMEOUT_MS", "1500"),
        ("HOMEBUDGET_CURRENCY", "USD"),
    ])
    .unwrap();
    assert_eq!(config.api_url, "https://budget.example.com/api");
    assert_eq!(config.timeout, Duration::from_millis(1500));
    assert_eq!(config.currency, "USD");
}

#[test]
fn test_blank_values_fall_back_to_defaults() {
    let config = config_from(&[("HOMEBUDGET_CURRENCY", "  "), ("HOMEBUDGET_API_URL", "")]).unwrap();
    assert_eq!(config.currency, "KES");
    assert_eq!(config.api_url, DEFAULT_API_URL);
}

#[test]
fn test_bad_timeout_is_an_error() {
    assert!(config_from(&[("HOMEBUDGET_TIMEOUT_MS", "soon")]).is_err());
    assert!(config_from(&[("HOMEBUDGET_TIMEOUT_MS", "0")]).is_err());
}

#[test]
fn test_bad_url_is_an_error() {
    let err = config_from(&[("HOMEBUDGET_API_URL", "localhost:5000")])
        .err()
        .unwrap();
    assert!(err.to_string().contains("HOMEBUDGET_API_URL"));
}

#[test]
fn test_ensure_data_dir_creates_it() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let config = config_from(&[("HOMEBUDGET_DATA_DIR", nested.to_str().unwrap())]).unwrap();
    config.ensure_data_dir().unwrap();
    assert!(nested.is_dir());
}
