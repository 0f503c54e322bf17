use std::path::Path;
use thiserror::Error;

use super::types::MonitorConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Environment variable overriding `threshold_percent`
pub const THRESHOLD_PERCENT_ENV: &str = "THRESHOLD_PERCENT";
/// Environment variable overriding `interval_secs`
pub const INTERVAL_ENV: &str = "MONITOR_INTERVAL_SECS";

/// Load monitoring configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MonitorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: MonitorConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<MonitorConfig, ConfigError> {
    let default_config = include_str!("monitor_config.json");
    load_config_from_str(default_config)
}

fn parse_env<T: std::str::FromStr>(var: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value,
    })
}

impl MonitorConfig {
    /// Apply `THRESHOLD_PERCENT` / `MONITOR_INTERVAL_SECS` from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(THRESHOLD_PERCENT_ENV) {
            self.threshold_percent = parse_env(THRESHOLD_PERCENT_ENV, value)?;
        }
        if let Some(value) = lookup(INTERVAL_ENV) {
            self.interval_secs = parse_env(INTERVAL_ENV, value)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold_percent >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "threshold_percent must be >= 0, got {}",
                self.threshold_percent
            )));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be > 0".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be > 0".to_string()));
        }
        if !(self.var_confidence > 0.0 && self.var_confidence < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "var_confidence must be in (0, 1), got {}",
                self.var_confidence
            )));
        }
        if let Some(t) = self.tracked.iter().find(|t| t.exchanges.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "tracked asset {} lists no exchanges",
                t.asset
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreachAction, TrackedAsset};
    use aegis_core::{ExchangeId, StrategyKind};
    use std::collections::HashMap;

    #[test]
    fn test_load_default_config() {
        let config = load_default_config().unwrap();
        config.validate().unwrap();
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.threshold_percent, 10.0);
        assert_eq!(config.breach_action, BreachAction::AlertOnly);
        assert_eq!(config.default_strategy, StrategyKind::DeltaNeutral);
        assert_eq!(
            config.tracked_asset("BTC").unwrap().exchanges,
            vec![ExchangeId::Deribit, ExchangeId::Okx, ExchangeId::Bybit]
        );
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = load_config_from_str(r#"{"tracked":[{"asset":"SOL"}]}"#).unwrap();
        assert_eq!(config.var_confidence, 0.95);
        assert_eq!(config.option_defaults.put_strike_ratio, 0.9);
        assert_eq!(config.tracked[0].exchanges, ExchangeId::PRIORITY.to_vec());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = load_config_from_str(r#"{"default_strategy":"straddle"}"#);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("THRESHOLD_PERCENT", "5"), ("MONITOR_INTERVAL_SECS", "15")]
            .into_iter()
            .collect();
        let mut config = MonitorConfig::default();
        config
            .apply_overrides(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.threshold_percent, 5.0);
        assert_eq!(config.interval_secs, 15);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = MonitorConfig::default();
        let err = config
            .apply_overrides(|var| (var == THRESHOLD_PERCENT_ENV).then(|| "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var, .. } if var == "THRESHOLD_PERCENT"));
    }

    #[test]
    fn test_validation() {
        let mut config = MonitorConfig::default();
        config.threshold_percent = -1.0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.var_confidence = 1.0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.tracked.push(TrackedAsset::new("BTC", Vec::new()));
        assert!(config.validate().is_err());
    }
}
