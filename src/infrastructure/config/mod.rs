//! Infrastructure configuration modules.

pub mod guardian;
pub mod logging;
pub mod paper;
pub mod settings;

pub use guardian::{GuardianConfig, TrailingConfig};
pub use logging::LoggingConfig;
pub use paper::PaperConfig;
pub use settings::Config;
