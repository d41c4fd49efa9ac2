use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::policy::{
    DEFAULT_MAX_RETRIES, DEFAULT_RECOVERABLE_ERROR_CODES, DEFAULT_RECOVERABLE_TYPE_MARKER,
};

/// Backoff parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/dbfailover/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Database error codes considered transient (node-failover family).
    pub recoverable_error_codes: Vec<i32>,
    /// Marker naming the driver error type treated as always recoverable.
    pub recoverable_type_marker: String,
    /// Optional backoff parameters; if missing, built-in defaults are used.
    #[serde(default)]
    pub backoff: Option<BackoffConfig>,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            recoverable_error_codes: DEFAULT_RECOVERABLE_ERROR_CODES.to_vec(),
            recoverable_type_marker: DEFAULT_RECOVERABLE_TYPE_MARKER.to_string(),
            backoff: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dbfailover")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FailoverConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FailoverConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FailoverConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FailoverConfig::default();
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.recoverable_error_codes.len(), 8);
        assert!(cfg.recoverable_error_codes.contains(&3113));
        assert_eq!(cfg.recoverable_type_marker, "recoverable");
        assert!(cfg.backoff.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = FailoverConfig::default();
        cfg.backoff = Some(BackoffConfig::default());
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FailoverConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_retries, cfg.max_retries);
        assert_eq!(parsed.recoverable_error_codes, cfg.recoverable_error_codes);
        assert_eq!(parsed.recoverable_type_marker, cfg.recoverable_type_marker);
        assert!(parsed.backoff.is_some());
    }

    #[test]
    fn backoff_section_is_optional_when_parsing() {
        let cfg: FailoverConfig = toml::from_str(
            r#"
            max_retries = 3
            recoverable_error_codes = [3113, 3114]
            recoverable_type_marker = "recoverable"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.max_retries, 3);
        assert!(cfg.backoff.is_none());
    }
}
