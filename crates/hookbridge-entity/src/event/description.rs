//! Protocol-agnostic description of one event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::message::ChatMessage;
use crate::attribute::Attribute;
use crate::identity::Identity;

/// Class of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    /// Chat conversation; carries messages, no data stream.
    Chat,
    /// File exchange; carries one data stream and no messages.
    FileExchange,
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::FileExchange => write!(f, "file_exchange"),
        }
    }
}

/// The mapper's description of one notification.
///
/// `messages` and `data_file` are mutually exclusive: chat events carry
/// messages and no data file, file-exchange events carry a data file and
/// an empty message list. Use [`EventDescription::chat`] and
/// [`EventDescription::file_exchange`] to build values that hold this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescription {
    /// Event title, sent as the `event_name` attribute.
    pub name: String,
    /// Event class.
    pub class: EventClass,
    /// PushAPI service name.
    pub service: String,
    /// Senders, in transmission order.
    pub senders: Vec<Identity>,
    /// Receivers, in transmission order.
    pub receivers: Vec<Identity>,
    /// File whose content becomes the event's data stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// Attributes of the data stream.
    pub data_attrs: Vec<Attribute>,
    /// Chat messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

impl EventDescription {
    /// A chat event.
    pub fn chat(
        name: impl Into<String>,
        service: impl Into<String>,
        senders: Vec<Identity>,
        receivers: Vec<Identity>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            name: name.into(),
            class: EventClass::Chat,
            service: service.into(),
            senders,
            receivers,
            data_file: None,
            data_attrs: Vec::new(),
            messages: Some(messages),
        }
    }

    /// A file-exchange event streaming the content of `data_file`.
    pub fn file_exchange(
        name: impl Into<String>,
        service: impl Into<String>,
        senders: Vec<Identity>,
        receivers: Vec<Identity>,
        data_file: impl Into<PathBuf>,
        data_attrs: Vec<Attribute>,
    ) -> Self {
        Self {
            name: name.into(),
            class: EventClass::FileExchange,
            service: service.into(),
            senders,
            receivers,
            data_file: Some(data_file.into()),
            data_attrs,
            messages: Some(Vec::new()),
        }
    }

    /// Whether the messages/data-file exclusivity holds.
    pub fn is_consistent(&self) -> bool {
        let has_messages = self.messages.as_ref().is_some_and(|m| !m.is_empty());
        !(has_messages && self.data_file.is_some())
    }

    /// Text of the first chat message, if any.
    pub fn first_message_text(&self) -> Option<&str> {
        self.messages
            .as_ref()
            .and_then(|m| m.first())
            .map(|m| m.text.as_str())
    }
}
