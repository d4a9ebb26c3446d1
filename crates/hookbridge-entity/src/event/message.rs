//! Chat messages carried by chat-class events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel accepted in place of a timestamp, meaning "at assembly time".
pub const SENT_NOW: &str = "now";

/// When a chat message was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SentTime {
    /// Substituted with the current time when the event is assembled.
    Now,
    /// Explicit `YYYY-MM-DDThh:mm:ss[+-]hh:mm` timestamp.
    At(String),
}

impl From<String> for SentTime {
    fn from(value: String) -> Self {
        if value == SENT_NOW {
            Self::Now
        } else {
            Self::At(value)
        }
    }
}

impl From<&str> for SentTime {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<SentTime> for String {
    fn from(value: SentTime) -> Self {
        match value {
            SentTime::Now => SENT_NOW.to_string(),
            SentTime::At(ts) => ts,
        }
    }
}

impl fmt::Display for SentTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now => write!(f, "{SENT_NOW}"),
            Self::At(ts) => write!(f, "{ts}"),
        }
    }
}

/// One chat message of an event description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// UTF-8 message text.
    pub text: String,
    /// Send time.
    pub sent_time: SentTime,
    /// Index into the event's sender list.
    pub sender_no: usize,
    /// Local id of a data stream holding the text instead of `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<i64>,
}

impl ChatMessage {
    /// A message from sender `sender_no`, stamped at assembly time.
    pub fn now(text: impl Into<String>, sender_no: usize) -> Self {
        Self {
            text: text.into(),
            sent_time: SentTime::Now,
            sender_no,
            data_id: None,
        }
    }
}
