//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for settings, positions and order records.
//! - [`observer`] - `RecordingObserver`, which keeps every snapshot it sees.
//! - [`wait`] - Polling helpers for snapshot streams.

pub mod domain;
pub mod observer;
pub mod wait;
