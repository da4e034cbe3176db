// Logger configuration
use serde::{Deserialize, Serialize};

use crate::LoggerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,
    /// Human-readable output instead of JSON lines
    pub development: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            development: false,
        }
    }
}

impl LoggerConfig {
    /// Parse the configured level name.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidLevel`] for anything `tracing` does not recognise.
    pub fn parse_level(&self) -> Result<tracing::Level, LoggerError> {
        let raw = self.level.trim();
        if raw.is_empty() {
            return Ok(tracing::Level::INFO);
        }
        raw.parse::<tracing::Level>()
            .map_err(|_| LoggerError::InvalidLevel(self.level.clone()))
    }
}
