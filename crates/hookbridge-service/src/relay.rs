//! Webhook processing pipeline: map, assemble, transmit, report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use hookbridge_core::config::AppConfig;
use hookbridge_core::config::capture::CaptureConfig;
use hookbridge_core::result::AppResult;
use hookbridge_entity::EventDescription;
use hookbridge_pushapi::{Credentials, PROTOCOL_VERSION};

use crate::assembler::EventAssembler;
use crate::connector::Connector;
use crate::context::ProcessingContext;
use crate::mapper::{EventMapper, Payload, UPLOADED_FILE_KEY};
use crate::notifier::TelegramNotifier;
use crate::session::TransmissionSession;

/// Turns webhooks into committed capture-server events.
///
/// One instance is shared by all requests; every call builds its own
/// [`ProcessingContext`] and session.
#[derive(Clone)]
pub struct RelayService {
    mapper: EventMapper,
    assembler: EventAssembler,
    connector: Arc<dyn Connector>,
    credentials: Credentials,
    client_version: i32,
    notifier: Option<TelegramNotifier>,
    notify_on_success: bool,
    remove_uploads: bool,
}

impl std::fmt::Debug for RelayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayService")
            .field("target", &self.connector.describe())
            .field("client_version", &self.client_version)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl RelayService {
    /// Creates the pipeline from configuration and a connector.
    pub fn new(config: &AppConfig, connector: Arc<dyn Connector>) -> AppResult<Self> {
        Ok(Self {
            mapper: EventMapper::new(config.mapper.clone()),
            assembler: EventAssembler::from_config(&config.capture),
            connector,
            credentials: credentials(&config.capture),
            client_version: config.capture.client_version.unwrap_or(PROTOCOL_VERSION),
            notifier: TelegramNotifier::from_config(&config.notifier)?,
            notify_on_success: config.notifier.notify_on_success,
            remove_uploads: config.upload.remove_after_send,
        })
    }

    /// The mapper in use.
    pub fn mapper(&self) -> &EventMapper {
        &self.mapper
    }

    /// Process a JSON webhook body and report the outcome.
    pub async fn handle_webhook(&self, body: Bytes) -> AppResult<String> {
        let ctx = ProcessingContext::new("get_hook");
        info!(request_id = %ctx.request_id, bytes = body.len(), "Webhook received");
        let result = self.process_webhook(&ctx, &body).await;
        self.report(&ctx, &result);
        result
    }

    /// Process an uploaded file and report the outcome. The spooled file is
    /// removed afterwards when so configured.
    pub async fn handle_upload(&self, payload: Payload, spooled: PathBuf) -> AppResult<String> {
        let ctx = ProcessingContext::new("upload_hook");
        info!(
            request_id = %ctx.request_id,
            file = %spooled.display(),
            "Upload received"
        );
        let result = self.process_upload(&ctx, payload, &spooled).await;
        self.report(&ctx, &result);
        if self.remove_uploads {
            remove_spooled(&spooled).await;
        }
        result
    }

    /// Map, assemble, and transmit a JSON webhook body.
    pub async fn process_webhook(&self, ctx: &ProcessingContext, body: &[u8]) -> AppResult<String> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        debug!(request_id = %ctx.request_id, payload = %value, "Webhook payload");
        self.trace_payload(ctx, &value.to_string());

        let payload = Payload::from_value(value)?;
        let event = self.mapper.classify(&payload)?;
        info!(
            request_id = %ctx.request_id,
            request_type = event.kind(),
            "Webhook classified"
        );
        let desc = self.mapper.describe(&event, &ctx.ids);
        self.transmit(ctx, &desc).await
    }

    /// Map, assemble, and transmit an uploaded file.
    pub async fn process_upload(
        &self,
        ctx: &ProcessingContext,
        mut payload: Payload,
        spooled: &Path,
    ) -> AppResult<String> {
        payload.insert(UPLOADED_FILE_KEY, spooled.to_string_lossy().into_owned());
        let event = self.mapper.parse_upload(&payload)?;
        let desc = self.mapper.describe(&event, &ctx.ids);
        self.transmit(ctx, &desc).await
    }

    /// Assemble `desc` and send it in a fresh session.
    pub async fn transmit(&self, ctx: &ProcessingContext, desc: &EventDescription) -> AppResult<String> {
        let event = self.assembler.assemble(desc, &ctx.ids, None).await?;
        debug!(
            request_id = %ctx.request_id,
            target = %self.connector.describe(),
            senders = event.senders.len(),
            receivers = event.receivers.len(),
            streams = event.data.len(),
            messages = event.messages.len(),
            "Event assembled"
        );
        let processor = self.connector.connect().await?;
        TransmissionSession::new(processor, self.credentials.clone(), self.client_version)
            .send_event(&event)
            .await
    }

    /// Connect, check the version, and verify credentials.
    pub async fn check_server(&self) -> AppResult<i32> {
        let processor = self.connector.connect().await?;
        let mut session =
            TransmissionSession::new(processor, self.credentials.clone(), self.client_version);
        session.handshake().await
    }

    fn trace_payload(&self, ctx: &ProcessingContext, payload: &str) {
        if let (Some(notifier), true) = (&self.notifier, self.notify_on_success) {
            notifier.notify(format!("[{}] payload received: {payload}", ctx.request_id));
        }
    }

    fn report(&self, ctx: &ProcessingContext, result: &AppResult<String>) {
        match result {
            Ok(guid) => {
                info!(
                    request_id = %ctx.request_id,
                    source = %ctx.source,
                    %guid,
                    elapsed_ms = ctx.elapsed_ms(),
                    "Event delivered"
                );
                if let (Some(notifier), true) = (&self.notifier, self.notify_on_success) {
                    notifier.notify(format!("[{}] event delivered: {guid}", ctx.request_id));
                }
            }
            Err(err) => {
                error!(
                    request_id = %ctx.request_id,
                    source = %ctx.source,
                    kind = %err.kind,
                    error = %err,
                    elapsed_ms = ctx.elapsed_ms(),
                    "Webhook processing failed"
                );
                if let Some(notifier) = &self.notifier {
                    let what = if err.is_mapping_error() {
                        "could not read webhook"
                    } else {
                        "could not deliver event"
                    };
                    notifier.notify(format!("[{}] {what}: {err}", ctx.request_id));
                }
            }
        }
    }
}

fn credentials(config: &CaptureConfig) -> Credentials {
    Credentials::new(&config.company_name, &config.token)
}

async fn remove_spooled(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(file = %path.display(), "Spooled upload removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(file = %path.display(), error = %e, "Failed to remove spooled upload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailurePoint, RecordedCall, RecordingProcessor};
    use hookbridge_core::error::ErrorKind;
    use hookbridge_entity::{ChatMessage, EventClass, Identity};
    use serde_json::json;
    use std::io::Write;

    fn config() -> AppConfig {
        AppConfig::from_toml_str(
            r#"
            [capture]
            host = "capture.example.com"
            port = 9090
            company_name = "acme"
            token = "secret"
            server_ip = "10.1.1.1"
            server_fqdn = "relay.example.com"
            "#,
        )
        .unwrap()
    }

    fn relay(processor: &RecordingProcessor) -> RelayService {
        RelayService::new(&config(), Arc::new(processor.clone())).unwrap()
    }

    fn body(value: serde_json::Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[tokio::test]
    async fn test_node_created_is_delivered() {
        let processor = RecordingProcessor::new();
        let guid = relay(&processor)
            .handle_webhook(body(json!({
                "request_type": "node_created",
                "path": "/Bitrix1/files/help.txt",
                "owner": "Bitrix1",
                "size": 788,
                "datetime": 1666779532
            })))
            .await
            .unwrap();
        assert_eq!(guid, processor.guid());

        let events = processor.events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.class, EventClass::Chat);
        assert_eq!(event.attribute("capture_server_ip"), Some("10.1.1.1"));
        assert_eq!(event.name(), Some("OwnCloud: file uploaded"));
        assert_eq!(event.messages[0].sender_id, event.senders[0].local_id);
        assert!(event.messages[0].text.contains("788"));

        let calls = processor.calls();
        assert!(calls.contains(&RecordedCall::VerifyCredentials {
            company_name: "acme".into()
        }));
    }

    #[tokio::test]
    async fn test_missing_owner_sends_nothing() {
        let processor = RecordingProcessor::new();
        let err = relay(&processor)
            .handle_webhook(body(json!({ "request_type": "node_created", "path": "/a/b" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(processor.call_names().is_empty());
    }

    #[tokio::test]
    async fn test_garbage_body_is_serialization_error() {
        let processor = RecordingProcessor::new();
        let err = relay(&processor)
            .handle_webhook(Bytes::from_static(b"not json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
        assert!(processor.call_names().is_empty());
    }

    #[tokio::test]
    async fn test_json_uploaded_file_is_refused() {
        let mut secret = tempfile::NamedTempFile::new().unwrap();
        secret.write_all(b"do not send").unwrap();
        let path = secret.path().to_string_lossy().into_owned();

        for value in [
            json!({ "path": "/a/files/x.txt", "owner": "a", "uploaded_file": &path }),
            json!({
                "request_type": "node_created",
                "path": "/a/files/x.txt",
                "owner": "a",
                "uploaded_file": &path
            }),
        ] {
            let processor = RecordingProcessor::new();
            let err = relay(&processor).handle_webhook(body(value)).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidField);
            assert!(processor.call_names().is_empty());
        }
        assert!(secret.path().exists());
    }

    #[tokio::test]
    async fn test_bad_sender_index_sends_nothing() {
        let ctx = ProcessingContext::new("test");
        let desc = EventDescription::chat(
            "title",
            "im_skype",
            vec![Identity::skype_person(&ctx.ids, "alice")],
            vec![Identity::skype_person(&ctx.ids, "bob")],
            vec![ChatMessage::now("hi", 1)],
        );
        let processor = RecordingProcessor::new();
        let err = relay(&processor).transmit(&ctx, &desc).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexOutOfRange);
        assert!(processor.call_names().is_empty());
        assert!(processor.events().is_empty());
    }

    #[tokio::test]
    async fn test_upload_streams_file_and_removes_spool() {
        let dir = tempfile::tempdir().unwrap();
        let spooled = dir.path().join("upload.bin");
        std::fs::File::create(&spooled)
            .unwrap()
            .write_all(b"attachment")
            .unwrap();

        let processor = RecordingProcessor::new();
        let payload = Payload::from_pairs([("path", "/alice/files/plan.docx"), ("owner", "alice")]);
        relay(&processor)
            .handle_upload(payload, spooled.clone())
            .await
            .unwrap();

        let sent: Vec<Bytes> = processor
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::SendStreamData { data, .. } => Some(data),
                _ => None,
            })
            .collect();
        assert_eq!(sent, vec![Bytes::from_static(b"attachment")]);

        let event = &processor.events()[0];
        assert_eq!(event.class, EventClass::FileExchange);
        assert!(event.messages.is_empty());
        assert_eq!(event.data[0].filename(), Some("plan.docx"));
        assert!(!spooled.exists());
    }

    #[tokio::test]
    async fn test_failed_upload_still_removes_spool() {
        let dir = tempfile::tempdir().unwrap();
        let spooled = dir.path().join("upload.bin");
        std::fs::write(&spooled, b"attachment").unwrap();

        let processor = RecordingProcessor::new().failing_at(FailurePoint::SendStreamData);
        let payload = Payload::from_pairs([("path", "/a/files/x.txt"), ("owner", "a")]);
        assert!(
            relay(&processor)
                .handle_upload(payload, spooled.clone())
                .await
                .is_err()
        );
        assert_eq!(processor.call_names().last(), Some(&"EndEvent(abort)"));
        assert!(!spooled.exists());
    }

    #[tokio::test]
    async fn test_check_server() {
        let processor = RecordingProcessor::new();
        assert_eq!(relay(&processor).check_server().await.unwrap(), PROTOCOL_VERSION);
        assert_eq!(
            processor.call_names(),
            vec!["GetVersion", "VerifyCredentials"]
        );
    }
}
