use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// A failure reported by an exchange adapter, normalized at the adapter
/// boundary into an optional numeric code plus a message.
///
/// Whether the failure means "the referenced order is gone" is decided by
/// [`crate::port::NotFoundSignature`]; everything else is retried on the next
/// reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterError {
    /// Broker-specific numeric code, when the venue supplied one.
    pub code: Option<i64>,
    /// Human-readable message as reported by the venue.
    pub message: String,
}

impl AdapterError {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An error without a broker code.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// An error carrying a broker code.
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self::new(Some(code), message)
    }

    /// The adapter call did not complete within its deadline.
    pub fn timeout(operation: &str, after: Duration) -> Self {
        Self::message(format!(
            "{operation} timed out after {}ms",
            after.as_millis()
        ))
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AdapterError {}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("engine startup failed: {0}")]
    Startup(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
