//! Runtime configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use chief_governance::params::DEFAULT_MAX_SLATE_SIZE;

use crate::RuntimeError;

/// Configuration for a [`Runtime`](crate::Runtime).
///
/// Can be loaded from a TOML file via [`RuntimeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Longest slate the approval ledger accepts.
    #[serde(default = "default_max_slate_size")]
    pub max_slate_size: usize,

    /// Gas available to each top-level call.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    /// Symbol of the token voters lock.
    #[serde(default = "default_stake_symbol")]
    pub stake_symbol: String,

    /// Symbol of the receipt token minted on deposit.
    #[serde(default = "default_receipt_symbol")]
    pub receipt_symbol: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_max_slate_size() -> usize {
    DEFAULT_MAX_SLATE_SIZE
}

fn default_gas_limit() -> u64 {
    10_000_000
}

fn default_stake_symbol() -> String {
    "MKR".to_string()
}

fn default_receipt_symbol() -> String {
    "IOU".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl RuntimeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RuntimeError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(s).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Check the settings are usable. Call again after applying overrides.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.gas_limit == 0 {
            return Err(RuntimeError::Config("gas_limit must be positive".into()));
        }
        if self.stake_symbol == self.receipt_symbol {
            return Err(RuntimeError::Config(format!(
                "stake and receipt tokens share the symbol '{}'",
                self.stake_symbol
            )));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_slate_size: default_max_slate_size(),
            gas_limit: default_gas_limit(),
            stake_symbol: default_stake_symbol(),
            receipt_symbol: default_receipt_symbol(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = RuntimeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = RuntimeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.max_slate_size, 5);
        assert_eq!(config.gas_limit, 10_000_000);
        assert_eq!(config.stake_symbol, "MKR");
        assert_eq!(config.receipt_symbol, "IOU");
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            max_slate_size = 3
            log_level = "debug"
        "#;
        let config = RuntimeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.max_slate_size, 3);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.gas_limit, 10_000_000);
    }

    #[test]
    fn zero_gas_limit_is_rejected() {
        let err = RuntimeConfig::from_toml_str("gas_limit = 0").unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn overrides_are_checked_after_loading() {
        let mut config = RuntimeConfig::from_toml_str("").unwrap();
        config.gas_limit = 0;
        assert!(matches!(config.validate(), Err(RuntimeError::Config(_))));

        let mut config = RuntimeConfig::default();
        config.receipt_symbol = config.stake_symbol.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("share the symbol 'MKR'"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "receipt_symbol = \"VOTE\"").unwrap();
        let config = RuntimeConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.receipt_symbol, "VOTE");
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = RuntimeConfig::from_toml_file("/nonexistent/chief.toml");
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
