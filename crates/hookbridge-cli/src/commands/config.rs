//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use hookbridge_core::config::AppConfig;
use hookbridge_core::error::{AppError, ErrorKind};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets masked
    Show,
    /// Validate configuration files
    Validate,
    /// Write the default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = masked(super::load_config(config_path, env)?);
            match format {
                OutputFormat::Json => output::print_json(&config),
                OutputFormat::Table => println!("{:#?}", config),
            }
        }
        ConfigCommand::Validate => match super::load_config(config_path, env) {
            Ok(config) => {
                output::print_success(&format!(
                    "Configuration '{}' (env: {}) is valid",
                    config_path, env
                ));
                output::print_kv(
                    "Server",
                    &format!("{}:{}", config.server.host, config.server.port),
                );
                output::print_kv("Capture server", &config.capture.address());
                output::print_kv(
                    "Certificate check",
                    config.capture.tls.ca_file.as_deref().unwrap_or("disabled"),
                );
                output::print_kv("Spool dir", &config.upload.spool_dir);
                output::print_kv(
                    "Notifier",
                    if config.notifier.enabled && config.notifier.is_usable() {
                        "enabled"
                    } else {
                        "disabled"
                    },
                );
                if config.capture.tls.ca_file.is_none() {
                    output::print_warning("Capture server certificate will not be validated");
                }
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, format!("Failed to create dir: {e}"), e)
                })?;
            }

            tokio::fs::write(out_path, default_config).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("Failed to write config: {e}"), e)
            })?;

            output::print_success(&format!("Default config written to '{}'", out_path));
        }
    }

    Ok(())
}

/// Replace secrets with a fixed mask.
fn masked(mut config: AppConfig) -> AppConfig {
    config.capture.token = mask_secret(&config.capture.token);
    config.notifier.bot_token = mask_secret(&config.notifier.bot_token);
    config
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "****".to_string()
    }
}
