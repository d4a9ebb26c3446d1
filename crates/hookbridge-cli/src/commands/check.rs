//! Capture server connectivity check.

use crate::output;
use hookbridge_core::error::AppError;

/// Connect, compare protocol versions, and verify credentials.
pub async fn execute(config_path: &str, env: &str) -> Result<(), AppError> {
    let config = super::load_config(config_path, env)?;
    let (relay, _) = super::build_relay(&config, false)?;

    println!("Checking capture server {}...", config.capture.address());
    let version = relay.check_server().await?;

    output::print_success("Capture server accepted the credentials");
    output::print_kv("Server version", &version.to_string());
    output::print_kv("Company", &config.capture.company_name);
    Ok(())
}
