//! `[paper]` section: the in-process venue used by `guardian run`.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    /// Signed starting position; zero starts flat.
    #[serde(default)]
    pub position: Decimal,
    #[serde(default = "default_entry_price")]
    pub entry_price: Decimal,
    /// First price of the random walk; defaults to the entry price.
    #[serde(default)]
    pub start_price: Option<Decimal>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Largest per-tick move as a fraction of price.
    #[serde(default = "default_volatility")]
    pub volatility: Decimal,
}

fn default_entry_price() -> Decimal {
    Decimal::from(100)
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_volatility() -> Decimal {
    Decimal::new(2, 3) // 0.2%
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            position: Decimal::ZERO,
            entry_price: default_entry_price(),
            start_price: None,
            tick_interval_ms: default_tick_interval_ms(),
            volatility: default_volatility(),
        }
    }
}

impl PaperConfig {
    #[must_use]
    pub fn start_price(&self) -> Decimal {
        self.start_price.unwrap_or(self.entry_price)
    }
}
