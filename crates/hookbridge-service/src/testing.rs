//! In-memory `EventProcessor` that records every call.
//!
//! Used for dry runs from the CLI and as the capture server stand-in in
//! tests. Clones share one call log.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use hookbridge_core::result::AppResult;
use hookbridge_pushapi::{
    Credentials, Event, EventId, EventProcessor, PROTOCOL_VERSION, PushApiError, StreamId,
};

use crate::connector::Connector;

/// One recorded RPC call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `GetVersion`
    GetVersion,
    /// `VerifyCredentials`
    VerifyCredentials {
        /// Company that was checked.
        company_name: String,
    },
    /// `BeginEvent`
    BeginEvent {
        /// The submitted event.
        event: Box<Event>,
    },
    /// `BeginStream`
    BeginStream {
        /// Event id.
        event_id: EventId,
        /// Local data id.
        data_id: i64,
    },
    /// `SendStreamData`
    SendStreamData {
        /// Event id.
        event_id: EventId,
        /// Stream id.
        stream_id: StreamId,
        /// Content that was sent.
        data: Bytes,
    },
    /// `EndStream`
    EndStream {
        /// Event id.
        event_id: EventId,
        /// Stream id.
        stream_id: StreamId,
    },
    /// `GetEventDatabaseId`
    GetEventDatabaseId {
        /// Event id.
        event_id: EventId,
    },
    /// `EndEvent`
    EndEvent {
        /// Event id.
        event_id: EventId,
        /// Whether the event was aborted.
        abort: bool,
    },
}

impl RecordedCall {
    /// Method name; `EndEvent` is suffixed with `(commit)` or `(abort)`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetVersion => "GetVersion",
            Self::VerifyCredentials { .. } => "VerifyCredentials",
            Self::BeginEvent { .. } => "BeginEvent",
            Self::BeginStream { .. } => "BeginStream",
            Self::SendStreamData { .. } => "SendStreamData",
            Self::EndStream { .. } => "EndStream",
            Self::GetEventDatabaseId { .. } => "GetEventDatabaseId",
            Self::EndEvent { abort: false, .. } => "EndEvent(commit)",
            Self::EndEvent { abort: true, .. } => "EndEvent(abort)",
        }
    }
}

/// Call at which the processor should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// Fail `GetVersion`.
    GetVersion,
    /// Reject the credentials.
    VerifyCredentials,
    /// Fail `BeginEvent`.
    BeginEvent,
    /// Fail `BeginStream`.
    BeginStream,
    /// Fail `SendStreamData`.
    SendStreamData,
    /// Fail `EndStream`.
    EndStream,
    /// Fail `GetEventDatabaseId`.
    GetEventDatabaseId,
    /// Fail `EndEvent`.
    EndEvent,
}

/// Recording processor with optional failure injection.
#[derive(Debug, Clone)]
pub struct RecordingProcessor {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    server_version: i32,
    fail_at: Option<FailurePoint>,
    event_id: EventId,
    guid: String,
}

impl Default for RecordingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingProcessor {
    /// A processor that accepts everything.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            server_version: PROTOCOL_VERSION,
            fail_at: None,
            event_id: 1001,
            guid: "00000000-0000-0000-0000-000000001001".to_string(),
        }
    }

    /// Report `version` from `GetVersion`.
    pub fn with_server_version(mut self, version: i32) -> Self {
        self.server_version = version;
        self
    }

    /// Fail the given call with a server error.
    pub fn failing_at(mut self, point: FailurePoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    /// GUID returned by `GetEventDatabaseId`.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Recorded calls so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log().clone()
    }

    /// Names of the recorded calls.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.log().iter().map(RecordedCall::name).collect()
    }

    /// Events submitted through `BeginEvent`.
    pub fn events(&self) -> Vec<Event> {
        self.log()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::BeginEvent { event } => Some((**event).clone()),
                _ => None,
            })
            .collect()
    }

    fn log(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        // A poisoned log only means a test panicked mid-record.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: RecordedCall, point: FailurePoint) -> Result<(), PushApiError> {
        let method = call.name();
        self.log().push(call);
        if self.fail_at == Some(point) {
            return Err(PushApiError::Server {
                method: method.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EventProcessor for RecordingProcessor {
    async fn get_version(&mut self) -> Result<i32, PushApiError> {
        self.record(RecordedCall::GetVersion, FailurePoint::GetVersion)?;
        Ok(self.server_version)
    }

    async fn verify_credentials(&mut self, credentials: &Credentials) -> Result<(), PushApiError> {
        self.record(
            RecordedCall::VerifyCredentials {
                company_name: credentials.company_name.clone(),
            },
            FailurePoint::VerifyCredentials,
        )
    }

    async fn begin_event(
        &mut self,
        event: &Event,
        _credentials: &Credentials,
    ) -> Result<EventId, PushApiError> {
        self.record(
            RecordedCall::BeginEvent {
                event: Box::new(event.clone()),
            },
            FailurePoint::BeginEvent,
        )?;
        Ok(self.event_id)
    }

    async fn begin_stream(
        &mut self,
        event_id: EventId,
        data_id: i64,
    ) -> Result<StreamId, PushApiError> {
        self.record(
            RecordedCall::BeginStream { event_id, data_id },
            FailurePoint::BeginStream,
        )?;
        Ok(data_id + 500)
    }

    async fn send_stream_data(
        &mut self,
        event_id: EventId,
        stream_id: StreamId,
        data: Bytes,
    ) -> Result<(), PushApiError> {
        self.record(
            RecordedCall::SendStreamData {
                event_id,
                stream_id,
                data,
            },
            FailurePoint::SendStreamData,
        )
    }

    async fn end_stream(
        &mut self,
        event_id: EventId,
        stream_id: StreamId,
    ) -> Result<(), PushApiError> {
        self.record(
            RecordedCall::EndStream {
                event_id,
                stream_id,
            },
            FailurePoint::EndStream,
        )
    }

    async fn get_event_database_id(&mut self, event_id: EventId) -> Result<String, PushApiError> {
        self.record(
            RecordedCall::GetEventDatabaseId { event_id },
            FailurePoint::GetEventDatabaseId,
        )?;
        Ok(self.guid.clone())
    }

    async fn end_event(&mut self, event_id: EventId, abort: bool) -> Result<(), PushApiError> {
        self.record(
            RecordedCall::EndEvent { event_id, abort },
            FailurePoint::EndEvent,
        )
    }
}

#[async_trait]
impl Connector for RecordingProcessor {
    async fn connect(&self) -> AppResult<Box<dyn EventProcessor>> {
        Ok(Box::new(self.clone()))
    }

    fn describe(&self) -> String {
        "in-memory recorder".to_string()
    }
}
