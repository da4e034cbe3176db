//! Server settings: an optional YAML file overlaid by `PORTAL__*` environment variables.

use auth_rebac::KetoConfig;
use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "configs/app.yaml";
pub const ENV_PREFIX: &str = "PORTAL";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub server: ServerSettings,
    pub logging: LoggerConfig,
    pub identity: IdentityHeaders,
    pub keto: KetoConfig,
    pub webhook: WebhookCredentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address, `host:port`
    pub address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Request headers set by the authenticating proxy in front of the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityHeaders {
    pub subject_header: String,
    pub roles_header: String,
    pub user_type_header: String,
    pub tenant_header: String,
}

impl Default for IdentityHeaders {
    fn default() -> Self {
        Self {
            subject_header: "X-User-Id".to_string(),
            roles_header: "X-User-Roles".to_string(),
            user_type_header: "X-User-Type".to_string(),
            tenant_header: "X-Tenant-Id".to_string(),
        }
    }
}

/// Basic auth credentials expected on identity-provider webhooks.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for WebhookCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl PortalSettings {
    /// Load settings from `path` (skipped when absent) and the environment,
    /// e.g. `PORTAL__KETO__READ_REMOTE=http://keto:4466`.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or mistyped sources and on settings that do not validate.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let settings: Self = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Rejects an invalid Keto section, a blank listen address or an unknown log level.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.server.address.trim().is_empty() {
            return Err(SettingsError::Invalid("server.address is empty".to_string()));
        }
        self.keto
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        self.logging
            .parse_level()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        Ok(())
    }
}
