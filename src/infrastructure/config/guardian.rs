//! `[guardian]` section: symbol and protection parameters.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::GuardianSettings;
use crate::domain::{RiskParams, StopDistance, TrailingParams};

/// Trailing take-profit configuration. Omit the table to disable trailing.
#[derive(Debug, Clone, Deserialize)]
pub struct TrailingConfig {
    /// Favourable move from entry that arms the order (e.g., 0.05 = 5%).
    pub activation_pct: Decimal,
    /// Venue callback rate in percent (e.g., 0.5 = 0.5%).
    #[serde(default = "default_callback_rate")]
    pub callback_rate: Decimal,
}

fn default_callback_rate() -> Decimal {
    Decimal::new(5, 1)
}

impl From<&TrailingConfig> for TrailingParams {
    fn from(config: &TrailingConfig) -> Self {
        Self {
            activation_pct: config.activation_pct,
            callback_rate: config.callback_rate,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardianConfig {
    /// Symbol to guard (e.g., "BTCUSDT").
    #[serde(default)]
    pub symbol: String,
    /// Distance of the stop from entry.
    #[serde(default)]
    pub stop_distance: StopDistance,
    #[serde(default)]
    pub trailing: Option<TrailingConfig>,
    /// Absolute price difference tolerated before an order is replaced.
    #[serde(default = "default_price_tolerance")]
    pub price_tolerance: Decimal,
    /// Venue price increment.
    #[serde(default = "default_price_tick")]
    pub price_tick: Decimal,
    #[serde(default = "default_safety_net_interval_ms")]
    pub safety_net_interval_ms: u64,
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,
    #[serde(default = "default_trade_log_cap")]
    pub trade_log_cap: usize,
    /// Requery open orders every N safety-net ticks (0 disables).
    #[serde(default = "default_open_order_resync_ticks")]
    pub open_order_resync_ticks: u32,
}

fn default_price_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

fn default_price_tick() -> Decimal {
    Decimal::new(1, 2)
}

const fn default_safety_net_interval_ms() -> u64 {
    3000
}

const fn default_adapter_timeout_ms() -> u64 {
    2500
}

const fn default_trade_log_cap() -> usize {
    200
}

const fn default_open_order_resync_ticks() -> u32 {
    10
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            stop_distance: StopDistance::default(),
            trailing: None,
            price_tolerance: default_price_tolerance(),
            price_tick: default_price_tick(),
            safety_net_interval_ms: default_safety_net_interval_ms(),
            adapter_timeout_ms: default_adapter_timeout_ms(),
            trade_log_cap: default_trade_log_cap(),
            open_order_resync_ticks: default_open_order_resync_ticks(),
        }
    }
}

impl GuardianConfig {
    /// Engine settings for this section.
    #[must_use]
    pub fn settings(&self) -> GuardianSettings {
        let risk = RiskParams {
            stop_distance: self.stop_distance,
            trailing: self.trailing.as_ref().map(TrailingParams::from),
            price_tick: self.price_tick,
        };
        GuardianSettings {
            symbol: self.symbol.trim().to_string(),
            risk,
            price_tolerance: self.price_tolerance,
            safety_net_interval: Duration::from_millis(self.safety_net_interval_ms),
            adapter_timeout: Duration::from_millis(self.adapter_timeout_ms),
            trade_log_cap: self.trade_log_cap,
            open_order_resync_ticks: self.open_order_resync_ticks,
        }
    }
}
