//! Builds wire-level events from event descriptions.

use bytes::Bytes;
use chrono::Local;
use tracing::debug;

use hookbridge_core::config::capture::CaptureConfig;
use hookbridge_core::error::{AppError, ErrorKind};
use hookbridge_core::result::AppResult;
use hookbridge_entity::{Attribute, EventDescription, IdSequence, SentTime};
use hookbridge_pushapi::constants::{
    EVENT_ATTR_CAPTURE_DATE, EVENT_ATTR_CAPTURE_SERVER_FQDN, EVENT_ATTR_CAPTURE_SERVER_IP,
    EVENT_ATTR_EVENT_NAME,
};
use hookbridge_pushapi::types::{ChatMessage, Event, EventData};

/// `YYYY-MM-DDThh:mm:ss[+-]hh:mm`
const CAPTURE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Current local time in the capture timestamp format.
pub fn capture_timestamp() -> String {
    Local::now().format(CAPTURE_TIME_FORMAT).to_string()
}

/// Converts [`EventDescription`]s into [`Event`]s.
#[derive(Debug, Clone)]
pub struct EventAssembler {
    server_ip: String,
    server_fqdn: String,
}

impl EventAssembler {
    /// Creates an assembler stamping events with the given capture host.
    pub fn new(server_ip: impl Into<String>, server_fqdn: impl Into<String>) -> Self {
        Self {
            server_ip: server_ip.into(),
            server_fqdn: server_fqdn.into(),
        }
    }

    /// Creates an assembler from the capture configuration.
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(&config.server_ip, &config.server_fqdn)
    }

    /// Assemble `desc` into a wire event.
    ///
    /// `capture_date` defaults to the current time. The data file, when set,
    /// is read in full and becomes the event's only data stream with a
    /// fresh id from `ids`. Every message's `sender_no` must index
    /// `desc.senders`.
    pub async fn assemble(
        &self,
        desc: &EventDescription,
        ids: &IdSequence,
        capture_date: Option<String>,
    ) -> AppResult<Event> {
        if !desc.is_consistent() {
            return Err(AppError::internal(
                "event description carries both chat messages and a data file",
            ));
        }

        let mut event = Event::new(desc.class, &desc.service);
        let now = capture_timestamp();

        event.attributes.push(Attribute::new(
            EVENT_ATTR_CAPTURE_DATE,
            capture_date.unwrap_or_else(|| now.clone()),
        ));
        event
            .attributes
            .push(Attribute::new(EVENT_ATTR_CAPTURE_SERVER_IP, &self.server_ip));
        event
            .attributes
            .push(Attribute::new(EVENT_ATTR_CAPTURE_SERVER_FQDN, &self.server_fqdn));
        if !desc.name.is_empty() {
            event
                .attributes
                .push(Attribute::new(EVENT_ATTR_EVENT_NAME, &desc.name));
        }

        event.senders.extend(desc.senders.iter().cloned());
        event.receivers.extend(desc.receivers.iter().cloned());

        if let Some(path) = &desc.data_file {
            let content = tokio::fs::read(path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("cannot read data file {}: {e}", path.display()),
                    e,
                )
            })?;
            let data = EventData {
                local_id: ids.next_id(),
                content: Bytes::from(content),
                attributes: desc.data_attrs.clone(),
            };
            debug!(
                data_id = data.local_id,
                bytes = data.content.len(),
                path = %path.display(),
                "Attached data stream"
            );
            event.data.push(data);
        }

        if let Some(messages) = &desc.messages {
            for (index, message) in messages.iter().enumerate() {
                let sender = desc.senders.get(message.sender_no).ok_or_else(|| {
                    AppError::index_out_of_range(format!(
                        "message {index} names sender {} but the event has {} senders",
                        message.sender_no,
                        desc.senders.len()
                    ))
                })?;
                let sent_time = match &message.sent_time {
                    SentTime::Now => now.clone(),
                    SentTime::At(ts) => ts.clone(),
                };
                event.messages.push(ChatMessage {
                    sender_id: sender.local_id,
                    sent_time,
                    text: message.text.clone(),
                    data_id: message.data_id,
                });
            }
        }

        Ok(event)
    }
}
