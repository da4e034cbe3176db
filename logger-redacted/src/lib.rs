//! Logging setup for the agent portal
//!
//! Installs a `tracing-subscriber` registry driven by [`LoggerConfig`]:
//!
//! - **Level filtering**: `RUST_LOG` wins, otherwise the configured level
//! - **JSON lines** in production, pretty output when `development = true`
//! - **Redaction**: [`Redactor`] masks phone numbers, e-mail addresses and
//!   `Authorization` header values before they are recorded in a field
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{LoggerConfig, Redactor};
//!
//! logger_redacted::init(&LoggerConfig::default()).expect("logger");
//!
//! let redactor = Redactor::default();
//! tracing::warn!(authorization = %redactor.redact("Basic a3JhdG9zOnMzY3JldA=="), "webhook rejected");
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use thiserror::Error;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when the configured level is unknown or a subscriber is already installed.
pub fn init(config: &LoggerConfig) -> Result<(), LoggerError> {
    let level = config.parse_level()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.development {
        registry.with(fmt::layer().pretty().with_target(true)).try_init()
    } else {
        registry
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .try_init()
    };

    installed.map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
}
