//! Hand-built chat and file-exchange events.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::output::{self, OutputFormat};
use hookbridge_core::config::AppConfig;
use hookbridge_core::error::AppError;
use hookbridge_entity::{Attribute, ChatMessage, EventDescription, IdSequence, Identity};
use hookbridge_pushapi::constants::DATA_ATTR_FILENAME;
use hookbridge_service::ProcessingContext;

/// Arguments for `send-chat`
#[derive(Debug, Args)]
pub struct SendChatArgs {
    /// Skype id of the sender
    #[arg(long)]
    pub from: String,
    /// Skype ids of the receivers
    #[arg(long, required = true)]
    pub to: Vec<String>,
    /// Message text
    #[arg(long)]
    pub text: String,
    /// Event name
    #[arg(long, default_value = "Chat message")]
    pub name: String,
    /// Record the protocol calls instead of contacting the server
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for `send-file`
#[derive(Debug, Args)]
pub struct SendFileArgs {
    /// E-mail address of the sender
    #[arg(long)]
    pub from: String,
    /// E-mail addresses of the receivers
    #[arg(long, required = true)]
    pub to: Vec<String>,
    /// File to stream as the event's data
    pub path: PathBuf,
    /// Event name
    #[arg(long, default_value = "File exchange")]
    pub name: String,
    /// Record the protocol calls instead of contacting the server
    #[arg(long)]
    pub dry_run: bool,
}

/// Chat event from `args`, one message sent now by the single sender.
pub fn chat_description(args: &SendChatArgs, service: &str, ids: &IdSequence) -> EventDescription {
    let senders = vec![Identity::skype_person(ids, &args.from)];
    let receivers = args
        .to
        .iter()
        .map(|to| Identity::skype_person(ids, to))
        .collect();
    EventDescription::chat(
        &args.name,
        service,
        senders,
        receivers,
        vec![ChatMessage::now(&args.text, 0)],
    )
}

/// File-exchange event from `args`, streaming `args.path`.
pub fn file_description(args: &SendFileArgs, service: &str, ids: &IdSequence) -> EventDescription {
    let senders = vec![Identity::email_person(ids, &args.from)];
    let receivers = args
        .to
        .iter()
        .map(|to| Identity::email_person(ids, to))
        .collect();
    EventDescription::file_exchange(
        &args.name,
        service,
        senders,
        receivers,
        &args.path,
        vec![Attribute::new(DATA_ATTR_FILENAME, file_name(&args.path))],
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Execute `send-chat`
pub async fn execute_chat(
    args: &SendChatArgs,
    config_path: &str,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path, env)?;
    let ctx = ProcessingContext::new("cli");
    let desc = chat_description(args, &config.mapper.service, &ctx.ids);
    transmit(&config, &ctx, &desc, args.dry_run, format).await
}

/// Execute `send-file`
pub async fn execute_file(
    args: &SendFileArgs,
    config_path: &str,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path, env)?;
    let ctx = ProcessingContext::new("cli");
    let desc = file_description(args, &config.mapper.service, &ctx.ids);
    transmit(&config, &ctx, &desc, args.dry_run, format).await
}

async fn transmit(
    config: &AppConfig,
    ctx: &ProcessingContext,
    desc: &EventDescription,
    dry_run: bool,
    format: OutputFormat,
) -> Result<(), AppError> {
    super::map::print_description(desc, format);

    let (relay, recorder) = super::build_relay(config, dry_run)?;
    let guid = relay.transmit(ctx, desc).await?;

    output::print_success(&format!("Event committed: {guid}"));
    if let Some(recorder) = recorder {
        output::print_warning("Dry run, nothing was sent. Recorded calls:");
        for name in recorder.call_names() {
            println!("  {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbridge_entity::{ContactKind, EventClass};

    #[test]
    fn test_chat_description() {
        let args = SendChatArgs {
            from: "alice".into(),
            to: vec!["bob".into(), "carol".into()],
            text: "hello".into(),
            name: "Chat message".into(),
            dry_run: true,
        };
        let desc = chat_description(&args, "im_skype", &IdSequence::new());
        assert_eq!(desc.class, EventClass::Chat);
        assert_eq!(desc.receivers.len(), 2);
        assert_eq!(desc.first_message_text(), Some("hello"));
        assert_eq!(desc.senders[0].contacts[0].kind, ContactKind::Skype);
    }

    #[test]
    fn test_file_description_names_the_data() {
        let args = SendFileArgs {
            from: "alice@example.com".into(),
            to: vec!["bob@example.com".into()],
            path: PathBuf::from("/tmp/report.pdf"),
            name: "File exchange".into(),
            dry_run: true,
        };
        let desc = file_description(&args, "im_skype", &IdSequence::new());
        assert_eq!(desc.class, EventClass::FileExchange);
        assert_eq!(desc.data_file.as_deref(), Some(Path::new("/tmp/report.pdf")));
        assert_eq!(
            desc.data_attrs,
            vec![Attribute::new(DATA_ATTR_FILENAME, "report.pdf")]
        );
        assert!(desc.is_consistent());
    }
}
