//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod capture;
pub mod logging;
pub mod mapper;
pub mod notifier;
pub mod upload;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::capture::CaptureConfig;
use self::logging::LoggingConfig;
use self::mapper::MapperConfig;
use self::notifier::NotifierConfig;
use self::upload::UploadConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "HOOKBRIDGE";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay) and `HOOKBRIDGE__*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Capture (PushAPI) server connection settings.
    pub capture: CaptureConfig,
    /// Webhook-to-event mapping settings.
    #[serde(default)]
    pub mapper: MapperConfig,
    /// Multipart upload spooling settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Operator chat notifier settings.
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config/default.toml`, the `config/{env}.toml`
    /// overlay, and environment variables prefixed with `HOOKBRIDGE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", env)
    }

    /// Load configuration from an explicit base file plus the environment
    /// overlay that sits next to it.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let base_path = std::path::Path::new(base);
        let overlay = base_path
            .parent()
            .map(|dir| dir.join(env))
            .unwrap_or_else(|| std::path::PathBuf::from(env));

        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::from(overlay).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_true() -> bool {
    true
}
