//! Dry-run webhook mapping.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use hookbridge_core::error::{AppError, ErrorKind};
use hookbridge_entity::{EventDescription, IdSequence, Identity};
use hookbridge_service::{EventMapper, Payload};

/// Arguments for `map`
#[derive(Debug, Args)]
pub struct MapArgs {
    /// Webhook request type, e.g. `node_created`
    pub request_type: String,
    /// JSON file holding the webhook payload
    pub payload: PathBuf,
}

/// One party of an event, for display.
#[derive(Debug, Serialize, Tabled)]
pub struct IdentityRow {
    /// Role in the event
    #[tabled(rename = "Role")]
    pub role: &'static str,
    /// Local id
    #[tabled(rename = "Id")]
    pub local_id: i64,
    /// Identity kind
    #[tabled(rename = "Kind")]
    pub kind: &'static str,
    /// Contacts as `kind=value`
    #[tabled(rename = "Contacts")]
    pub contacts: String,
}

impl IdentityRow {
    fn new(role: &'static str, identity: &Identity) -> Self {
        Self {
            role,
            local_id: identity.local_id,
            kind: identity.kind.as_str(),
            contacts: identity
                .contacts
                .iter()
                .map(|c| format!("{}={}", c.kind.as_str(), c.value))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Senders then receivers of `desc`.
pub fn identity_rows(desc: &EventDescription) -> Vec<IdentityRow> {
    desc.senders
        .iter()
        .map(|i| IdentityRow::new("sender", i))
        .chain(desc.receivers.iter().map(|i| IdentityRow::new("receiver", i)))
        .collect()
}

/// Print an event description in the selected format.
pub fn print_description(desc: &EventDescription, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(desc),
        OutputFormat::Table => {
            output::print_kv("Event", &desc.name);
            output::print_kv("Class", &desc.class.to_string());
            output::print_kv("Service", &desc.service);
            if let Some(file) = &desc.data_file {
                output::print_kv("Data file", &file.display().to_string());
            }
            output::print_list(&identity_rows(desc), format);
            if let Some(text) = desc.first_message_text() {
                println!();
                println!("{text}");
            }
        }
    }
}

/// Execute `map`
pub async fn execute(
    args: &MapArgs,
    config_path: &str,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path, env)?;
    let raw = tokio::fs::read(&args.payload).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("cannot read {}: {e}", args.payload.display()),
            e,
        )
    })?;
    let payload = Payload::from_value(serde_json::from_slice(&raw)?)?;

    let mapper = EventMapper::new(config.mapper);
    let desc = mapper.map(&args.request_type, &payload, &IdSequence::new())?;
    print_description(&desc, format);
    Ok(())
}
