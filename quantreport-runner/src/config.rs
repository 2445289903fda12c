//! Serializable reporting configuration, loaded from TOML.
//!
//! ```toml
//! [reporting]
//! currency_symbol = "$"
//! interval_secs = 5
//! output_dir = "."
//! risk_free_rate = 0.0
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```
//!
//! Every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::logging::LoggingConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub reporting: ReportingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportingConfig {
    /// Prefix for banner currency values.
    pub currency_symbol: String,
    /// Seconds between periodic reporting cycles.
    pub interval_secs: u64,
    /// Directory that receives log and result files.
    pub output_dir: PathBuf,
    /// Annual risk-free rate for the standard calculator.
    pub risk_free_rate: f64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".into(),
            interval_secs: 5,
            output_dir: PathBuf::from("."),
            risk_free_rate: 0.0,
        }
    }
}

impl ReportingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reporting.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reporting.interval_secs must be at least 1".into(),
            ));
        }
        if self.reporting.currency_symbol.is_empty() {
            return Err(ConfigError::Invalid(
                "reporting.currency_symbol must not be empty".into(),
            ));
        }
        if !self.reporting.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid(
                "reporting.risk_free_rate must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two runs with identical settings share a fingerprint; used as the
    /// compile id when the host does not supply one.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("unserializable config: {e}")))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.reporting.currency_symbol, "$");
        assert_eq!(config.reporting.interval(), Duration::from_secs(5));
    }

    #[test]
    fn partial_toml_overrides() {
        let config = AppConfig::from_toml(
            r#"
[reporting]
currency_symbol = "€"
interval_secs = 30

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.reporting.currency_symbol, "€");
        assert_eq!(config.reporting.interval_secs, 30);
        assert_eq!(config.reporting.output_dir, PathBuf::from("."));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn zero_interval_rejected() {
        let err = AppConfig::from_toml("[reporting]\ninterval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = AppConfig::from_toml("[reporting\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = AppConfig::default();
        let mut b = AppConfig::default();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.reporting.interval_secs = 60;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/quantreport.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
