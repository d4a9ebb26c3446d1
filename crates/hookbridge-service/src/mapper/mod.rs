//! Webhook to event mapping.
//!
//! A webhook payload is routed by its discriminator to one of a closed set
//! of variant builders. Each builder validates the fields it needs and
//! produces a [`WebhookEvent`]; [`EventMapper::describe`] then turns that
//! into the protocol-agnostic [`EventDescription`] the assembler consumes.

pub mod payload;
pub mod render;
pub mod variants;

use std::path::PathBuf;

use tracing::debug;

use hookbridge_core::config::mapper::MapperConfig;
use hookbridge_core::error::AppError;
use hookbridge_core::result::AppResult;
use hookbridge_entity::{Attribute, ChatMessage, EventClass, EventDescription, IdSequence, Identity};

pub use payload::{Payload, REQUEST_TYPE_KEY, UPLOADED_FILE_KEY};
pub use variants::{
    Common, FileTransmitting, NodeCreate, NodeDownload, NodeShare, NodeSharePermissionChange,
    ShareDetails,
};

/// What every webhook variant can report about itself.
pub trait Notification {
    /// Fields shared by all variants.
    fn common(&self) -> &Common;

    /// Chat message body; `None` for variants that carry no message.
    fn message(&self) -> Option<String>;

    /// Event title.
    fn title(&self) -> &str {
        &self.common().title
    }

    /// Class of the resulting event.
    fn event_class(&self) -> EventClass {
        EventClass::Chat
    }

    /// File to stream, with its data attributes.
    fn data_file(&self) -> Option<(PathBuf, Vec<Attribute>)> {
        None
    }
}

/// A validated webhook of one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `node_created`
    NodeCreate(NodeCreate),
    /// `node_downloaded`
    NodeDownload(NodeDownload),
    /// `node_shared`
    NodeShare(NodeShare),
    /// `node_share_permission_updated`
    NodeSharePermissionChange(NodeSharePermissionChange),
    /// An uploaded file attachment.
    FileTransmitting(FileTransmitting),
}

impl WebhookEvent {
    /// The variant as a capability object.
    pub fn notification(&self) -> &dyn Notification {
        match self {
            Self::NodeCreate(v) => v,
            Self::NodeDownload(v) => v,
            Self::NodeShare(v) => v,
            Self::NodeSharePermissionChange(v) => v,
            Self::FileTransmitting(v) => v,
        }
    }

    /// Short variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NodeCreate(_) => "node_created",
            Self::NodeDownload(_) => "node_downloaded",
            Self::NodeShare(_) => "node_shared",
            Self::NodeSharePermissionChange(_) => "node_share_permission_updated",
            Self::FileTransmitting(_) => "file_transmitting",
        }
    }
}

type Builder = fn(&Payload, &MapperConfig) -> AppResult<WebhookEvent>;

/// Request types accepted in the `request_type` field.
const REQUEST_TYPES: &[(&str, Builder)] = &[
    ("node_created", NodeCreate::build as Builder),
    ("node_downloaded", NodeDownload::build as Builder),
    ("node_shared", NodeShare::build as Builder),
    (
        "node_share_permission_updated",
        NodeSharePermissionChange::build as Builder,
    ),
];

/// Maps webhook payloads to event descriptions.
#[derive(Debug, Clone)]
pub struct EventMapper {
    config: MapperConfig,
}

impl EventMapper {
    /// Creates a mapper with the given labels and service name.
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Mapper settings.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Known request type names.
    pub fn request_types() -> impl Iterator<Item = &'static str> {
        REQUEST_TYPES.iter().map(|(name, _)| *name)
    }

    /// Validate a payload for an explicit request type.
    pub fn parse(&self, request_type: &str, payload: &Payload) -> AppResult<WebhookEvent> {
        let (_, build) = REQUEST_TYPES
            .iter()
            .find(|(name, _)| *name == request_type)
            .ok_or_else(|| AppError::unrecognized_request_type(request_type))?;
        build(payload, &self.config)
    }

    /// Validate a payload carrying an uploaded file.
    pub fn parse_upload(&self, payload: &Payload) -> AppResult<WebhookEvent> {
        FileTransmitting::build(payload, &self.config)
    }

    /// Route a JSON webhook on its `request_type`.
    ///
    /// `FileTransmitting` is only reachable through [`parse_upload`], whose
    /// file path comes from the upload spool. A JSON body naming a local
    /// file is refused.
    ///
    /// [`parse_upload`]: EventMapper::parse_upload
    pub fn classify(&self, payload: &Payload) -> AppResult<WebhookEvent> {
        if payload.contains(UPLOADED_FILE_KEY) {
            return Err(AppError::invalid_field(
                UPLOADED_FILE_KEY,
                "only accepted from multipart uploads",
            ));
        }
        let request_type = payload.required_str(REQUEST_TYPE_KEY)?;
        self.parse(&request_type, payload)
    }

    /// Describe a validated webhook. Identity ids come from `ids`.
    pub fn describe(&self, event: &WebhookEvent, ids: &IdSequence) -> EventDescription {
        let notification = event.notification();
        let common = notification.common();
        let senders = vec![Identity::skype_person(ids, &common.owner)];
        let receivers = vec![Identity::skype_person(ids, &common.recipient)];

        let description = match notification.data_file() {
            Some((path, attrs)) => EventDescription::file_exchange(
                notification.title(),
                &self.config.service,
                senders,
                receivers,
                path,
                attrs,
            ),
            None => EventDescription::chat(
                notification.title(),
                &self.config.service,
                senders,
                receivers,
                notification
                    .message()
                    .map(|text| vec![ChatMessage::now(text, 0)])
                    .unwrap_or_default(),
            ),
        };
        debug!(
            kind = event.kind(),
            class = %description.class,
            title = %description.name,
            "Mapped webhook"
        );
        description
    }

    /// Parse and describe in one step.
    pub fn map(
        &self,
        request_type: &str,
        payload: &Payload,
        ids: &IdSequence,
    ) -> AppResult<EventDescription> {
        let event = self.parse(request_type, payload)?;
        Ok(self.describe(&event, ids))
    }

    /// Parse and describe an upload in one step.
    pub fn map_upload(&self, payload: &Payload, ids: &IdSequence) -> AppResult<EventDescription> {
        let event = self.parse_upload(payload)?;
        Ok(self.describe(&event, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbridge_core::error::ErrorKind;
    use hookbridge_entity::ContactKind;
    use serde_json::json;

    fn mapper() -> EventMapper {
        EventMapper::new(MapperConfig {
            public_origin: "https://cloud.example.com".into(),
            ..MapperConfig::default()
        })
    }

    fn payload(value: serde_json::Value) -> Payload {
        Payload::from_value(value).unwrap()
    }

    fn created() -> Payload {
        payload(json!({
            "name": "help.txt",
            "size": 788,
            "path": "/Bitrix1/files/help.txt",
            "internalPath": "files/help.txt",
            "id": 21394,
            "owner": "Bitrix1",
            "datetime": 1666779532
        }))
    }

    fn share(extra: serde_json::Value) -> Payload {
        let mut base = json!({ "path": "/alice/files/report.pdf", "owner": "alice" });
        if let (Some(obj), Some(more)) = (base.as_object_mut(), extra.as_object()) {
            obj.extend(more.clone());
        }
        payload(base)
    }

    #[test]
    fn test_node_created_message() {
        let ids = IdSequence::new();
        let desc = mapper().map("node_created", &created(), &ids).unwrap();
        assert_eq!(desc.name, "OwnCloud: file uploaded");
        assert_eq!(desc.class, EventClass::Chat);
        assert!(desc.data_file.is_none());

        let text = desc.first_message_text().unwrap();
        assert!(text.starts_with("OwnCloud: file uploaded:\n"));
        assert!(text.contains("Bitrix1"));
        assert!(text.contains("help.txt"));
        assert!(text.contains("788"));

        assert_eq!(desc.senders[0].contacts[0].kind, ContactKind::Skype);
        assert_eq!(desc.senders[0].contacts[0].value, "Bitrix1");
        assert_eq!(desc.receivers[0].contacts[0].value, "All");
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let m = mapper();
        let a = m.map("node_created", &created(), &IdSequence::new()).unwrap();
        let b = m.map("node_created", &created(), &IdSequence::new()).unwrap();
        assert_eq!(a.first_message_text(), b.first_message_text());
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_owner_or_path() {
        let m = mapper();
        let ids = IdSequence::new();
        let err = m
            .map("node_created", &payload(json!({ "path": "/a/b" })), &ids)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains("owner"));

        let err = m
            .map("node_shared", &payload(json!({ "owner": "a" })), &ids)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains("path"));
    }

    #[test]
    fn test_created_requires_size_and_datetime() {
        let m = mapper();
        let ids = IdSequence::new();
        let p = payload(json!({ "path": "/a/b", "owner": "o", "size": 1 }));
        assert_eq!(
            m.map("node_created", &p, &ids).unwrap_err().kind,
            ErrorKind::MissingField
        );
        let p = payload(json!({ "path": "/a/b", "owner": "o", "size": 1, "datetime": "soon" }));
        assert_eq!(
            m.map("node_created", &p, &ids).unwrap_err().kind,
            ErrorKind::InvalidField
        );
    }

    #[test]
    fn test_unrecognized_request_type() {
        let err = mapper()
            .map("node_deleted", &created(), &IdSequence::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnrecognizedRequestType);
    }

    #[test]
    fn test_download_fallback_downloader() {
        let p = payload(json!({ "path": "/o/files/a.txt", "owner": "o", "size": "12" }));
        let desc = mapper().map("node_downloaded", &p, &IdSequence::new()).unwrap();
        let text = desc.first_message_text().unwrap();
        assert!(text.contains("Downloaded by: unknown"));
        assert!(!text.contains("Downloaded at"));

        let p = payload(json!({
            "path": "/o/files/a.txt", "owner": "o", "size": 12,
            "downloaded_by": "bob", "timestamp": 1666779532
        }));
        let desc = mapper().map("node_downloaded", &p, &IdSequence::new()).unwrap();
        let text = desc.first_message_text().unwrap();
        assert!(text.contains("Downloaded by: bob"));
        assert!(text.contains("Downloaded at: 2022-10-2"));
    }

    #[test]
    fn test_share_message_parts() {
        let p = share(json!({
            "share_type": 0,
            "share_with": "bob",
            "permissions": 31,
            "public_link_path": "/s/xyz",
            "passwordEnabled": true,
            "expiration": 1666779532
        }));
        let desc = mapper().map("node_shared", &p, &IdSequence::new()).unwrap();
        assert_eq!(desc.name, "OwnCloud: file access granted");
        let text = desc.first_message_text().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "OwnCloud: file access granted:");
        assert_eq!(lines[1], "Owner: alice");
        assert_eq!(lines[2], "File name: report.pdf");
        assert!(lines[3].starts_with("Expires: "));
        assert_eq!(lines[4], "Permissions: all");
        assert_eq!(lines[5], "Access: user: bob");
        assert_eq!(lines[6], "Link: https://cloud.example.com/s/xyz");
        assert_eq!(lines[7], "Password required.");
        assert_eq!(desc.receivers[0].contacts[0].value, "bob");
    }

    #[test]
    fn test_share_type_via_link_ignores_share_with() {
        let p = share(json!({ "share_type": "3", "share_with": "bob", "permissions": 99 }));
        let text = mapper()
            .map("node_shared", &p, &IdSequence::new())
            .unwrap()
            .first_message_text()
            .unwrap()
            .to_string();
        assert!(text.contains("Access: via link"));
        assert!(text.contains("Permissions: undefined: 99"));
        assert!(!text.contains("Password required"));
    }

    #[test]
    fn test_share_type_unknown() {
        let p = share(json!({ "share_type": 9 }));
        let desc = mapper().map("node_shared", &p, &IdSequence::new()).unwrap();
        assert!(
            desc.first_message_text()
                .unwrap()
                .contains("share type not defined")
        );
        assert_eq!(desc.receivers[0].contacts[0].value, "All");
    }

    #[test]
    fn test_permission_change_same_body_distinct_title() {
        let p = share(json!({ "share_type": "1", "share_with": "staff", "permissions": "3" }));
        let m = mapper();
        let shared = m.map("node_shared", &p, &IdSequence::new()).unwrap();
        let changed = m
            .map("node_share_permission_updated", &p, &IdSequence::new())
            .unwrap();
        assert_eq!(changed.name, "OwnCloud: file access permissions changed");
        assert_ne!(shared.name, changed.name);

        let body = |d: &EventDescription| {
            d.first_message_text()
                .unwrap()
                .lines()
                .skip(1)
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_eq!(body(&shared), body(&changed));
    }

    #[test]
    fn test_upload_maps_to_file_exchange() {
        let mut p = Payload::from_pairs([("path", "/alice/files/plan.docx"), ("owner", "alice")]);
        p.insert(UPLOADED_FILE_KEY, "/var/spool/abc.bin");
        let desc = mapper().map_upload(&p, &IdSequence::new()).unwrap();
        assert_eq!(desc.class, EventClass::FileExchange);
        assert_eq!(desc.name, "OwnCloud: file transfer: plan.docx");
        assert_eq!(desc.messages, Some(Vec::new()));
        assert_eq!(
            desc.data_file.as_deref(),
            Some(std::path::Path::new("/var/spool/abc.bin"))
        );
        assert_eq!(desc.data_attrs, vec![Attribute::new("filename", "plan.docx")]);
    }

    #[test]
    fn test_upload_without_file_is_missing_field() {
        let p = Payload::from_pairs([("path", "/a/b"), ("owner", "o")]);
        let err = mapper().map_upload(&p, &IdSequence::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains(UPLOADED_FILE_KEY));
    }

    #[test]
    fn test_classify_requires_request_type() {
        let err = mapper().classify(&created()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains(REQUEST_TYPE_KEY));

        let mut p = created();
        p.insert(REQUEST_TYPE_KEY, "node_created");
        assert!(matches!(
            mapper().classify(&p).unwrap(),
            WebhookEvent::NodeCreate(_)
        ));
    }

    #[test]
    fn test_classify_refuses_uploaded_file_key() {
        let mut p = created();
        p.insert(REQUEST_TYPE_KEY, "node_created");
        p.insert(UPLOADED_FILE_KEY, "/etc/passwd");
        let err = mapper().classify(&p).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidField);
        assert!(err.message.contains(UPLOADED_FILE_KEY));

        let mut p = Payload::from_pairs([("path", "/x/passwd"), ("owner", "eve")]);
        p.insert(UPLOADED_FILE_KEY, "/etc/passwd");
        assert_eq!(
            mapper().classify(&p).unwrap_err().kind,
            ErrorKind::InvalidField
        );
    }

    #[test]
    fn test_custom_source_label() {
        let m = EventMapper::new(MapperConfig {
            source_label: "Nextcloud".into(),
            ..MapperConfig::default()
        });
        let desc = m.map("node_created", &created(), &IdSequence::new()).unwrap();
        assert_eq!(desc.name, "Nextcloud: file uploaded");
    }

    #[test]
    fn test_request_types_listed() {
        let names: Vec<_> = EventMapper::request_types().collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"node_share_permission_updated"));
    }
}
