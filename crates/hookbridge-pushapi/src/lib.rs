//! # hookbridge-pushapi
//!
//! Client side of the PushAPI capture-server protocol: Apache Thrift
//! binary protocol messages carried over a length-framed TLS channel.
//!
//! The [`EventProcessor`] trait is the RPC surface the transmission
//! session drives; [`PushApiClient`] implements it over any async byte
//! stream and [`transport::connect`] opens the production TLS channel.

pub mod client;
pub mod constants;
pub mod error;
pub mod processor;
pub mod protocol;
pub mod transport;
pub mod types;

pub use client::PushApiClient;
pub use constants::PROTOCOL_VERSION;
pub use error::PushApiError;
pub use processor::{EventId, EventProcessor, StreamId};
pub use types::{ChatMessage, Credentials, Event, EventData};
