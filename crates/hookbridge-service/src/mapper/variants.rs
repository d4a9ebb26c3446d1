//! The five webhook variants and their builders.
//!
//! Builders are pure: they read the payload and configuration, validate
//! required fields, and render everything the message needs. No identity
//! ids are allocated here.

use std::path::PathBuf;

use hookbridge_core::config::mapper::MapperConfig;
use hookbridge_core::result::AppResult;
use hookbridge_entity::{Attribute, EventClass};
use hookbridge_pushapi::constants::DATA_ATTR_FILENAME;

use super::payload::{Payload, UPLOADED_FILE_KEY};
use super::render::{
    BROADCAST_RECIPIENT, UNKNOWN_DOWNLOADER, file_name, local_datetime, permission_description,
    public_link, share_type_description,
};
use super::{Notification, WebhookEvent};

/// Fields every variant carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Common {
    /// Event title.
    pub title: String,
    /// Owner of the file; becomes the sender.
    pub owner: String,
    /// Last component of `path`.
    pub file_name: String,
    /// `share_with`, or the broadcast placeholder.
    pub recipient: String,
}

impl Common {
    fn read(payload: &Payload, title: impl FnOnce(&str) -> String) -> AppResult<Self> {
        let path = payload.required_str("path")?;
        let owner = payload.required_str("owner")?;
        let file_name = file_name(&path);
        let recipient = payload
            .optional_str("share_with")?
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| BROADCAST_RECIPIENT.to_string());
        Ok(Self {
            title: title(&file_name),
            owner,
            file_name,
            recipient,
        })
    }

    fn header(&self) -> Vec<String> {
        vec![
            format!("{}:", self.title),
            format!("Owner: {}", self.owner),
            format!("File name: {}", self.file_name),
        ]
    }
}

/// A file was uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCreate {
    /// Shared fields.
    pub common: Common,
    /// Size in bytes, as sent.
    pub size: String,
    /// Rendered creation time.
    pub created_at: String,
}

impl NodeCreate {
    /// Build from a `node_created` payload.
    pub fn build(payload: &Payload, config: &MapperConfig) -> AppResult<WebhookEvent> {
        let common = Common::read(payload, |_| format!("{}: file uploaded", config.source_label))?;
        let size = payload.required_str("size")?;
        let created_at = local_datetime("datetime", payload.required_timestamp("datetime")?)?;
        Ok(WebhookEvent::NodeCreate(Self {
            common,
            size,
            created_at,
        }))
    }
}

impl Notification for NodeCreate {
    fn common(&self) -> &Common {
        &self.common
    }

    fn message(&self) -> Option<String> {
        let mut lines = self.common.header();
        lines.push(format!("File size (bytes): {}", self.size));
        lines.push(format!("Created: {}", self.created_at));
        Some(lines.join("\n"))
    }
}

/// A file was downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDownload {
    /// Shared fields.
    pub common: Common,
    /// Who downloaded the file.
    pub downloaded_by: String,
    /// Size in bytes, as sent.
    pub size: String,
    /// Rendered download time, when the webhook carries one.
    pub downloaded_at: Option<String>,
}

impl NodeDownload {
    /// Build from a `node_downloaded` payload.
    pub fn build(payload: &Payload, config: &MapperConfig) -> AppResult<WebhookEvent> {
        let common =
            Common::read(payload, |_| format!("{}: file downloaded", config.source_label))?;
        let size = payload.required_str("size")?;
        let downloaded_by = payload
            .optional_str("downloaded_by")?
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_DOWNLOADER.to_string());
        let downloaded_at = payload
            .optional_timestamp("timestamp")?
            .map(|ts| local_datetime("timestamp", ts))
            .transpose()?;
        Ok(WebhookEvent::NodeDownload(Self {
            common,
            downloaded_by,
            size,
            downloaded_at,
        }))
    }
}

impl Notification for NodeDownload {
    fn common(&self) -> &Common {
        &self.common
    }

    fn message(&self) -> Option<String> {
        let mut lines = self.common.header();
        lines.push(format!("Downloaded by: {}", self.downloaded_by));
        lines.push(format!("File size (bytes): {}", self.size));
        if let Some(at) = &self.downloaded_at {
            lines.push(format!("Downloaded at: {at}"));
        }
        Some(lines.join("\n"))
    }
}

/// Share settings common to share creation and permission changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareDetails {
    /// Rendered expiry time.
    pub expires_at: Option<String>,
    /// Permission description.
    pub permissions: Option<String>,
    /// Share-type description.
    pub access: String,
    /// Public link expanded against the configured origin.
    pub link: Option<String>,
    /// Whether the share is password protected.
    pub password_required: bool,
}

impl ShareDetails {
    fn read(payload: &Payload, common: &Common, config: &MapperConfig) -> AppResult<Self> {
        let expires_at = payload
            .optional_timestamp("expiration")?
            .map(|ts| local_datetime("expiration", ts))
            .transpose()?;
        let permissions = payload
            .optional_str("permissions")?
            .map(|raw| permission_description(&raw));
        let share_type = payload.optional_str("share_type")?;
        let access = share_type_description(share_type.as_deref(), &common.recipient);
        let link = payload
            .optional_str("public_link_path")?
            .filter(|p| !p.is_empty())
            .map(|p| public_link(&config.public_origin, &p));
        Ok(Self {
            expires_at,
            permissions,
            access,
            link,
            password_required: payload.flag("passwordEnabled"),
        })
    }

    fn render(&self, common: &Common) -> String {
        let mut lines = common.header();
        if let Some(at) = &self.expires_at {
            lines.push(format!("Expires: {at}"));
        }
        if let Some(perm) = &self.permissions {
            lines.push(format!("Permissions: {perm}"));
        }
        lines.push(format!("Access: {}", self.access));
        if let Some(link) = &self.link {
            lines.push(format!("Link: {link}"));
        }
        if self.password_required {
            lines.push("Password required.".to_string());
        }
        lines.join("\n")
    }
}

/// Access to a file was granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShare {
    /// Shared fields.
    pub common: Common,
    /// Share settings.
    pub share: ShareDetails,
}

impl NodeShare {
    /// Build from a `node_shared` payload.
    pub fn build(payload: &Payload, config: &MapperConfig) -> AppResult<WebhookEvent> {
        let common = Common::read(payload, |_| {
            format!("{}: file access granted", config.source_label)
        })?;
        let share = ShareDetails::read(payload, &common, config)?;
        Ok(WebhookEvent::NodeShare(Self { common, share }))
    }
}

impl Notification for NodeShare {
    fn common(&self) -> &Common {
        &self.common
    }

    fn message(&self) -> Option<String> {
        Some(self.share.render(&self.common))
    }
}

/// The permissions of an existing share changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSharePermissionChange {
    /// Shared fields.
    pub common: Common,
    /// Share settings after the change.
    pub share: ShareDetails,
}

impl NodeSharePermissionChange {
    /// Build from a `node_share_permission_updated` payload.
    pub fn build(payload: &Payload, config: &MapperConfig) -> AppResult<WebhookEvent> {
        let common = Common::read(payload, |_| {
            format!("{}: file access permissions changed", config.source_label)
        })?;
        let share = ShareDetails::read(payload, &common, config)?;
        Ok(WebhookEvent::NodeSharePermissionChange(Self {
            common,
            share,
        }))
    }
}

impl Notification for NodeSharePermissionChange {
    fn common(&self) -> &Common {
        &self.common
    }

    fn message(&self) -> Option<String> {
        Some(self.share.render(&self.common))
    }
}

/// A file was handed over for transmission as a data stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransmitting {
    /// Shared fields.
    pub common: Common,
    /// Spooled file whose content is streamed.
    pub uploaded_file: PathBuf,
}

impl FileTransmitting {
    /// Build from an upload payload carrying `uploaded_file`.
    pub fn build(payload: &Payload, config: &MapperConfig) -> AppResult<WebhookEvent> {
        let common = Common::read(payload, |name| {
            format!("{}: file transfer: {name}", config.source_label)
        })?;
        let uploaded_file = PathBuf::from(payload.required_str(UPLOADED_FILE_KEY)?);
        Ok(WebhookEvent::FileTransmitting(Self {
            common,
            uploaded_file,
        }))
    }
}

impl Notification for FileTransmitting {
    fn common(&self) -> &Common {
        &self.common
    }

    fn event_class(&self) -> EventClass {
        EventClass::FileExchange
    }

    fn message(&self) -> Option<String> {
        None
    }

    fn data_file(&self) -> Option<(PathBuf, Vec<Attribute>)> {
        Some((
            self.uploaded_file.clone(),
            vec![Attribute::new(DATA_ATTR_FILENAME, &self.common.file_name)],
        ))
    }
}
