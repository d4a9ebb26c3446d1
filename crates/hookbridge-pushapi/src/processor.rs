//! RPC surface of the capture server's `EventProcessor` service.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PushApiError;
use crate::types::{Credentials, Event};

/// Server-issued id of an open event.
pub type EventId = i64;
/// Server-issued id of an open data stream.
pub type StreamId = i64;

/// The eight calls of the PushAPI service.
///
/// Calls on one processor never overlap, hence `&mut self`. The production
/// implementation is [`crate::PushApiClient`]; tests substitute in-memory
/// recorders.
#[async_trait]
pub trait EventProcessor: Send {
    /// Protocol version implemented by the server.
    async fn get_version(&mut self) -> Result<i32, PushApiError>;

    /// Check company credentials. Rejection surfaces as a server error.
    async fn verify_credentials(&mut self, credentials: &Credentials) -> Result<(), PushApiError>;

    /// Open an event on the server.
    async fn begin_event(
        &mut self,
        event: &Event,
        credentials: &Credentials,
    ) -> Result<EventId, PushApiError>;

    /// Open the data stream with the given local data id.
    async fn begin_stream(
        &mut self,
        event_id: EventId,
        data_id: i64,
    ) -> Result<StreamId, PushApiError>;

    /// Send one block of stream content.
    async fn send_stream_data(
        &mut self,
        event_id: EventId,
        stream_id: StreamId,
        data: Bytes,
    ) -> Result<(), PushApiError>;

    /// Close a data stream.
    async fn end_stream(&mut self, event_id: EventId, stream_id: StreamId)
    -> Result<(), PushApiError>;

    /// Database id (GUID) of the event.
    async fn get_event_database_id(&mut self, event_id: EventId) -> Result<String, PushApiError>;

    /// Finalize the event, committing it unless `abort` is set.
    async fn end_event(&mut self, event_id: EventId, abort: bool) -> Result<(), PushApiError>;
}

#[async_trait]
impl<P: EventProcessor + ?Sized> EventProcessor for Box<P> {
    async fn get_version(&mut self) -> Result<i32, PushApiError> {
        (**self).get_version().await
    }

    async fn verify_credentials(&mut self, credentials: &Credentials) -> Result<(), PushApiError> {
        (**self).verify_credentials(credentials).await
    }

    async fn begin_event(
        &mut self,
        event: &Event,
        credentials: &Credentials,
    ) -> Result<EventId, PushApiError> {
        (**self).begin_event(event, credentials).await
    }

    async fn begin_stream(
        &mut self,
        event_id: EventId,
        data_id: i64,
    ) -> Result<StreamId, PushApiError> {
        (**self).begin_stream(event_id, data_id).await
    }

    async fn send_stream_data(
        &mut self,
        event_id: EventId,
        stream_id: StreamId,
        data: Bytes,
    ) -> Result<(), PushApiError> {
        (**self).send_stream_data(event_id, stream_id, data).await
    }

    async fn end_stream(
        &mut self,
        event_id: EventId,
        stream_id: StreamId,
    ) -> Result<(), PushApiError> {
        (**self).end_stream(event_id, stream_id).await
    }

    async fn get_event_database_id(&mut self, event_id: EventId) -> Result<String, PushApiError> {
        (**self).get_event_database_id(event_id).await
    }

    async fn end_event(&mut self, event_id: EventId, abort: bool) -> Result<(), PushApiError> {
        (**self).end_event(event_id, abort).await
    }
}
