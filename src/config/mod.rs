#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::{ConfigProvider, SyncMode};
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, validate_url, Validate};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const MAX_TIMEOUT_SECONDS: u64 = 600;

/// 合併 TOML 與命令列後的最終設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub sync_mode: SyncMode,
    pub verbose: bool,
    pub json_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
            sync_mode: SyncMode::default(),
            verbose: false,
            json_logs: false,
        }
    }
}

impl From<&toml_config::TomlConfig> for Settings {
    fn from(config: &toml_config::TomlConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            timeout_seconds: config.backend.as_ref().and_then(|b| b.timeout_seconds),
            sync_mode: config.sync_mode(),
            verbose: config.verbose(),
            json_logs: config.json_logs(),
        }
    }
}

impl ConfigProvider for Settings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        if let Some(timeout) = self.timeout_seconds {
            validate_range("timeout_seconds", timeout, 1, MAX_TIMEOUT_SECONDS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.base_url(), "http://127.0.0.1:8000");
        assert_eq!(settings.sync_mode(), SyncMode::Queued);
        assert!(settings.request_timeout().is_none());
    }

    #[test]
    fn test_settings_reject_zero_timeout() {
        let settings = Settings {
            timeout_seconds: Some(0),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
