//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading, validation and logging setup
//! - [`bootstrap`] - Wires a configured engine to the paper venue

pub mod bootstrap;
pub mod config;

pub use config::Config;
