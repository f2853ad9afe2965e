use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

use crate::erp::DateOrder;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// Receipts live in memory when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub erp: ErpConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Logo REST connection
///
/// Blank `base_url` or `username` means "not configured": the in-memory
/// ERP client is used instead.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErpConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_firm_no")]
    pub firm_no: u32,
    #[serde(default = "default_period_no")]
    pub period_no: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub date_order: DateOrder,
}

fn default_firm_no() -> u32 {
    1
}

fn default_period_no() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            firm_no: default_firm_no(),
            period_no: default_period_no(),
            timeout_secs: default_timeout_secs(),
            date_order: DateOrder::default(),
        }
    }
}

impl ErpConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.username.trim().is_empty()
    }

    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

/// Stale `processing` sweep
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecoveryConfig {
    pub enabled: bool,
    pub scan_interval_secs: u64,
    pub stale_threshold_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_secs: 60,
            stale_threshold_secs: 300,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override the Logo connection from `LOGO_*` variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOGO_API_URL") {
            self.erp.base_url = v;
        }
        if let Some(v) = lookup("LOGO_USERNAME") {
            self.erp.username = v;
        }
        if let Some(v) = lookup("LOGO_PASSWORD") {
            self.erp.password = v;
        }
        if let Some(v) = lookup("LOGO_FIRM_NO") {
            self.erp.firm_no = parse_number("LOGO_FIRM_NO", &v)?;
        }
        if let Some(v) = lookup("LOGO_PERIOD_NO") {
            self.erp.period_no = parse_number("LOGO_PERIOD_NO", &v)?;
        }
        if let Some(v) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.postgres_url = Some(v);
        }
        Ok(())
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: bridge.log
use_json: false
rotation: daily
gateway:
  host: 127.0.0.1
  port: 8080
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert!(config.postgres_url.is_none());
        assert!(!config.erp.is_configured());
        assert_eq!(config.erp.firm_no, 1);
        assert_eq!(config.erp.period_no, 1);
        assert_eq!(config.erp.date_order, DateOrder::YearFirst);
        assert!(config.recovery.enabled);
    }

    #[test]
    fn test_erp_section() {
        let yaml = format!(
            "{}erp:\n  base_url: https://logo.example.com/\n  username: svc\n  firm_no: 7\n  date_order: day_first\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml_str(&yaml).unwrap();
        assert!(config.erp.is_configured());
        assert_eq!(config.erp.base(), "https://logo.example.com");
        assert_eq!(config.erp.firm_no, 7);
        assert_eq!(config.erp.period_no, 1);
        assert_eq!(config.erp.date_order, DateOrder::DayFirst);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("LOGO_API_URL", "http://erp.local"),
            ("LOGO_USERNAME", "svc"),
            ("LOGO_PASSWORD", "secret"),
            ("LOGO_FIRM_NO", "3"),
        ]);
        let mut config = AppConfig::from_yaml_str(MINIMAL).unwrap();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert!(config.erp.is_configured());
        assert_eq!(config.erp.password, "secret");
        assert_eq!(config.erp.firm_no, 3);
        assert_eq!(config.erp.period_no, 1);
    }

    #[test]
    fn test_bad_firm_no_rejected() {
        let mut config = AppConfig::from_yaml_str(MINIMAL).unwrap();
        let err = config
            .apply_env_overrides(|k| (k == "LOGO_FIRM_NO").then(|| "one".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "LOGO_FIRM_NO", .. }));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::load("does-not-exist"),
            Err(ConfigError::Read { .. })
        ));
    }
}
