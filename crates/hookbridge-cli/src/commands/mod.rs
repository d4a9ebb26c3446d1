//! CLI command definitions and dispatch.

pub mod check;
pub mod config;
pub mod map;
pub mod send;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use hookbridge_core::config::AppConfig;
use hookbridge_core::error::AppError;
use hookbridge_service::testing::RecordingProcessor;
use hookbridge_service::{CaptureConnector, Connector, RelayService};

/// HookBridge: cloud storage webhooks to a capture server
#[derive(Debug, Parser)]
#[command(name = "hookbridge", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file, without extension
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Configuration overlay to apply; defaults to $HOOKBRIDGE_ENV or "development"
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Connect to the capture server and verify version and credentials
    Check,
    /// Map a webhook payload without sending it
    Map(map::MapArgs),
    /// Send a chat event
    SendChat(send::SendChatArgs),
    /// Send a file-exchange event
    SendFile(send::SendFileArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let env = self.environment();
        match &self.command {
            Commands::Check => check::execute(&self.config, &env).await,
            Commands::Map(args) => map::execute(args, &self.config, &env, self.format).await,
            Commands::SendChat(args) => {
                send::execute_chat(args, &self.config, &env, self.format).await
            }
            Commands::SendFile(args) => {
                send::execute_file(args, &self.config, &env, self.format).await
            }
            Commands::Config(args) => config::execute(args, &self.config, &env, self.format).await,
        }
    }

    fn environment(&self) -> String {
        self.env.clone().unwrap_or_else(|| {
            std::env::var("HOOKBRIDGE_ENV").unwrap_or_else(|_| "development".to_string())
        })
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str, env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load_from(config_path, env)
}

/// Helper: build the relay against the real capture server, or against an
/// in-memory recorder when `dry_run` is set.
pub fn build_relay(
    config: &AppConfig,
    dry_run: bool,
) -> Result<(RelayService, Option<RecordingProcessor>), AppError> {
    if dry_run {
        let recorder = RecordingProcessor::new();
        let relay = RelayService::new(config, Arc::new(recorder.clone()))?;
        return Ok((relay, Some(recorder)));
    }
    let connector: Arc<dyn Connector> = Arc::new(CaptureConnector::new(config.capture.clone())?);
    Ok((RelayService::new(config, connector)?, None))
}
