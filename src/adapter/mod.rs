//! Implementations of ports (hexagonal adapters).

pub mod paper;
pub mod wire;

pub use paper::{CallCounts, PaperExchange};
