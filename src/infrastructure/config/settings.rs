//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file, then `GUARDIAN_SYMBOL` and
//! `GUARDIAN_LOG_LEVEL` override the file when set.
//!
//! # Example
//!
//! ```no_run
//! use guardian::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::guardian::GuardianConfig;
use super::logging::LoggingConfig;
use super::paper::PaperConfig;
use crate::application::GuardianSettings;
use crate::error::{ConfigError, Result};

pub const SYMBOL_ENV: &str = "GUARDIAN_SYMBOL";
pub const LOG_LEVEL_ENV: &str = "GUARDIAN_LOG_LEVEL";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub guardian: GuardianConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub paper: PaperConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::load_unchecked(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and apply environment overrides without validating, so
    /// callers can layer further overrides (CLI flags) first.
    #[allow(clippy::result_large_err)]
    pub fn load_unchecked<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(symbol) = lookup(SYMBOL_ENV) {
            self.guardian.symbol = symbol.trim().to_string();
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.logging.level = level.trim().to_string();
        }
    }

    /// Check that all values are usable.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.guardian.symbol.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "symbol" }.into());
        }
        self.settings().validate()?;
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            }
            .into());
        }
        if self.paper.entry_price <= rust_decimal::Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "paper.entry_price",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.paper.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "paper.tick_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Engine settings from the `[guardian]` section.
    #[must_use]
    pub fn settings(&self) -> GuardianSettings {
        self.guardian.settings()
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopDistance;
    use crate::error::Error;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const FULL: &str = r#"
        [guardian]
        symbol = "BTCUSDT"
        price_tolerance = "0.05"
        price_tick = "0.1"
        safety_net_interval_ms = 1500
        adapter_timeout_ms = 800
        trade_log_cap = 50
        open_order_resync_ticks = 0

        [guardian.stop_distance]
        mode = "max_loss"
        value = "25"

        [guardian.trailing]
        activation_pct = "0.05"
        callback_rate = "0.8"

        [logging]
        level = "debug"
        format = "json"

        [paper]
        position = "-1.5"
        entry_price = "2500"
    "#;

    fn parse(content: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|_| None);
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn parses_full_config() {
        let config = parse(FULL).unwrap();
        let settings = config.settings();
        assert_eq!(settings.symbol, "BTCUSDT");
        assert_eq!(settings.risk.stop_distance, StopDistance::MaxLoss(dec!(25)));
        assert_eq!(settings.risk.trailing.map(|t| t.callback_rate), Some(dec!(0.8)));
        assert_eq!(settings.price_tolerance, dec!(0.05));
        assert_eq!(settings.safety_net_interval, Duration::from_millis(1500));
        assert_eq!(settings.adapter_timeout, Duration::from_millis(800));
        assert_eq!(settings.trade_log_cap, 50);
        assert_eq!(settings.open_order_resync_ticks, 0);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.paper.position, dec!(-1.5));
        assert_eq!(config.paper.start_price(), dec!(2500));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse("[guardian]\nsymbol = \"ETHUSDT\"\n").unwrap();
        let settings = config.settings();
        assert_eq!(settings.risk.stop_distance, StopDistance::Percent(dec!(0.02)));
        assert!(settings.risk.trailing.is_none());
        assert_eq!(settings.price_tolerance, dec!(0.01));
        assert_eq!(settings.safety_net_interval, Duration::from_millis(3000));
        assert_eq!(settings.adapter_timeout, Duration::from_millis(2500));
        assert_eq!(settings.trade_log_cap, 200);
        assert_eq!(settings.open_order_resync_ticks, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_symbol_is_reported() {
        let err = parse("[guardian]\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "symbol" })
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config: Config = toml::from_str(FULL).unwrap();
        config.apply_overrides(|key| match key {
            SYMBOL_ENV => Some(" SOLUSDT ".to_string()),
            LOG_LEVEL_ENV => Some("warn".to_string()),
            _ => None,
        });
        assert_eq!(config.guardian.symbol, "SOLUSDT");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut config: Config = toml::from_str(FULL).unwrap();
        config.apply_overrides(|_| Some("   ".to_string()));
        assert_eq!(config.guardian.symbol, "BTCUSDT");
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = parse("[guardian]\nsymbol = \"X\"\n[logging]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "logging.format",
                ..
            })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse("[guardian\nsymbol=").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
