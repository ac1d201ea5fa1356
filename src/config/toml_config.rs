use crate::config::DEFAULT_BASE_URL;
use crate::domain::ports::{ConfigProvider, SyncMode};
use crate::utils::error::{OrganizerError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: Option<BackendConfig>,
    pub sync: Option<SyncConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub mode: Option<SyncMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| OrganizerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ORGANIZER_URL})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OrganizerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// `[backend]` 可省略，省略時使用預設 URL 或命令列參數
    pub fn validate_config(&self) -> Result<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let base_url = validate_required_field("backend.base_url", &backend.base_url)?;
        validate_non_empty_string("backend.base_url", base_url)?;
        validate_url("backend.base_url", base_url)?;

        if let Some(timeout) = backend.timeout_seconds {
            validate_range("backend.timeout_seconds", timeout, 1, crate::config::MAX_TIMEOUT_SECONDS)?;
        }

        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        self.backend
            .as_ref()
            .and_then(|b| b.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.backend
            .as_ref()
            .and_then(|b| b.timeout_seconds)
            .map(Duration::from_secs)
    }

    fn sync_mode(&self) -> SyncMode {
        self.sync.as_ref().and_then(|s| s.mode).unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
