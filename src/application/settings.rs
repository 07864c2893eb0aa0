//! Runtime settings for one guardian instance.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::domain::{RiskParams, StopDistance};
use crate::error::ConfigError;

/// Validated inputs for a [`super::GuardianEngine`].
#[derive(Debug, Clone)]
pub struct GuardianSettings {
    pub symbol: String,
    pub risk: RiskParams,
    /// Absolute price distance within which an order counts as on target.
    pub price_tolerance: Decimal,
    /// Reconciliation runs at least this often without events.
    pub safety_net_interval: Duration,
    /// Deadline for each adapter call.
    pub adapter_timeout: Duration,
    pub trade_log_cap: usize,
    /// Requery open orders every N safety-net ticks; `0` disables.
    pub open_order_resync_ticks: u32,
}

impl GuardianSettings {
    /// Settings with default tuning for `symbol`.
    pub fn new(symbol: impl Into<String>, risk: RiskParams) -> Self {
        Self {
            symbol: symbol.into(),
            risk,
            price_tolerance: Decimal::new(1, 2),
            safety_net_interval: Duration::from_millis(3000),
            adapter_timeout: Duration::from_millis(2500),
            trade_log_cap: 200,
            open_order_resync_ticks: 10,
        }
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "symbol",
                reason: "must not be empty".to_string(),
            });
        }
        let distance_field = match self.risk.stop_distance {
            StopDistance::Percent(_) => "stop_distance.percent",
            StopDistance::MaxLoss(_) => "stop_distance.max_loss",
        };
        if self.risk.stop_distance.value() <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: distance_field,
                reason: "must be greater than 0".to_string(),
            });
        }
        if let StopDistance::Percent(pct) = self.risk.stop_distance {
            if pct >= Decimal::ONE {
                return Err(ConfigError::InvalidValue {
                    field: distance_field,
                    reason: "must be less than 1".to_string(),
                });
            }
        }
        if let Some(trailing) = self.risk.trailing {
            if trailing.activation_pct <= Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: "trailing.activation_pct",
                    reason: "must be greater than 0".to_string(),
                });
            }
            if trailing.callback_rate <= Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: "trailing.callback_rate",
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        if self.risk.price_tick <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "price_tick",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.price_tolerance < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "price_tolerance",
                reason: "must not be negative".to_string(),
            });
        }
        if self.safety_net_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "safety_net_interval_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.adapter_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "adapter_timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.trade_log_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "trade_log_cap",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrailingParams;
    use rust_decimal_macros::dec;

    fn risk() -> RiskParams {
        RiskParams {
            stop_distance: StopDistance::Percent(dec!(0.02)),
            trailing: None,
            price_tick: dec!(0.01),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(GuardianSettings::new("BTCUSDT", risk()).validate().is_ok());
    }

    #[test]
    fn rejects_blank_symbol() {
        let err = GuardianSettings::new("  ", risk()).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "symbol", .. }));
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let mut settings = GuardianSettings::new("BTCUSDT", risk());
        settings.risk.stop_distance = StopDistance::MaxLoss(dec!(0));
        assert!(settings.validate().is_err());

        let mut settings = GuardianSettings::new("BTCUSDT", risk());
        settings.safety_net_interval = Duration::ZERO;
        assert!(settings.validate().is_err());

        let mut settings = GuardianSettings::new("BTCUSDT", risk());
        settings.risk.trailing = Some(TrailingParams {
            activation_pct: dec!(0.05),
            callback_rate: dec!(0),
        });
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_percent_of_one_or_more() {
        let mut settings = GuardianSettings::new("BTCUSDT", risk());
        settings.risk.stop_distance = StopDistance::Percent(dec!(1));
        assert!(settings.validate().is_err());
    }
}
