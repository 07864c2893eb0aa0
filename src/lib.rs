//! Guardian - keeps protective orders on an open exchange position.
//!
//! The engine watches a single symbol through an exchange adapter and makes
//! sure that, whenever a position is open, exactly one stop-market order and
//! (optionally) one trailing-stop order sit on the book at the right price,
//! side and size. When the position goes flat every protective order is
//! cancelled.
//!
//! # Architecture
//!
//! - **`domain`** - Pure types: positions, order records, target math and
//!   the guard state machine. No I/O.
//! - **`port`** - The [`port::ExchangeAdapter`] trait the engine drives and
//!   the observer trait snapshots are pushed to.
//! - **`application`** - The reconciler, the engine that serializes passes,
//!   and snapshot emission.
//! - **`adapter`** - The in-memory paper venue and wire-format parsing.
//! - **`infrastructure`** - TOML configuration, logging and runtime wiring.
//! - **`cli`** - The `guardian` command line.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use guardian::adapter::PaperExchange;
//! use guardian::application::{GuardianEngine, GuardianSettings};
//! use guardian::domain::{RiskParams, StopDistance};
//! use rust_decimal_macros::dec;
//!
//! # async fn demo() -> guardian::error::Result<()> {
//! let venue = Arc::new(PaperExchange::new("BTCUSDT"));
//! let risk = RiskParams {
//!     stop_distance: StopDistance::Percent(dec!(0.02)),
//!     trailing: None,
//!     price_tick: dec!(0.01),
//! };
//! let engine = GuardianEngine::new(GuardianSettings::new("BTCUSDT", risk), venue)?;
//! engine.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
