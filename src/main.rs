//! HookBridge Server: cloud storage webhooks to a PushAPI capture server.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use hookbridge_core::config::AppConfig;
use hookbridge_core::error::AppError;
use hookbridge_service::{CaptureConnector, Connector};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(kind = %e.kind, "Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("HOOKBRIDGE_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("HOOKBRIDGE_ENV").unwrap_or_else(|_| "development".to_string());

    eprintln!("Loading config from '{}' (env: {})", config_path, env);
    AppConfig::load_from(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting HookBridge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        capture = %config.capture.address(),
        company = %config.capture.company_name,
        "Capture server configured"
    );

    let connector: Arc<dyn Connector> = Arc::new(CaptureConnector::new(config.capture.clone())?);
    hookbridge_api::run_server(config, connector).await
}
