//! Event description entities produced by the webhook mapper.

pub mod description;
pub mod message;

pub use description::{EventClass, EventDescription};
pub use message::{ChatMessage, SentTime};
