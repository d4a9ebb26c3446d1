//! The PushAPI transmission session.
//!
//! A session owns one processor connection and runs the begin/stream/end
//! protocol for a single event. Once `BeginEvent` succeeds the server holds
//! an open event that must be finalized exactly once; [`OpenEvent`] and
//! [`OpenStream`] are the handles for those obligations and can only be
//! given back through [`TransmissionSession::end_event`] and
//! [`TransmissionSession::end_stream`].

use std::fmt;

use bytes::Bytes;
use tracing::{debug, info, warn};

use hookbridge_core::error::{AppError, ErrorKind};
use hookbridge_core::result::AppResult;
use hookbridge_pushapi::{Credentials, Event, EventData, EventId, EventProcessor, StreamId};

/// Where a session is in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Channel open, nothing exchanged.
    Connected,
    /// Server version accepted.
    VersionChecked,
    /// Credentials accepted.
    CredentialsVerified,
    /// An event is open on the server.
    EventOpen,
    /// A data stream of the open event is open.
    StreamOpen,
    /// `EndEvent` is in flight.
    Finalizing,
    /// The event was committed.
    Committed,
    /// The event was aborted, or finalizing it failed.
    Aborted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::VersionChecked => "version_checked",
            Self::CredentialsVerified => "credentials_verified",
            Self::EventOpen => "event_open",
            Self::StreamOpen => "stream_open",
            Self::Finalizing => "finalizing",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };
        write!(f, "{name}")
    }
}

/// An event open on the server. Must be passed to `end_event`.
#[derive(Debug)]
#[must_use = "an open event must be finalized with end_event"]
pub struct OpenEvent {
    event_id: EventId,
}

impl OpenEvent {
    /// Server-issued event id.
    pub fn id(&self) -> EventId {
        self.event_id
    }
}

/// A data stream open on the server. Must be passed to `end_stream`.
#[derive(Debug)]
#[must_use = "an open stream must be closed with end_stream"]
pub struct OpenStream {
    event_id: EventId,
    stream_id: StreamId,
}

impl OpenStream {
    /// Server-issued stream id.
    pub fn id(&self) -> StreamId {
        self.stream_id
    }
}

/// One connection's worth of PushAPI protocol.
pub struct TransmissionSession<P> {
    processor: P,
    credentials: Credentials,
    client_version: i32,
    state: SessionState,
}

impl<P> fmt::Debug for TransmissionSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransmissionSession")
            .field("credentials", &self.credentials)
            .field("client_version", &self.client_version)
            .field("state", &self.state)
            .finish()
    }
}

impl<P: EventProcessor> TransmissionSession<P> {
    /// Start a session on an already connected processor.
    pub fn new(processor: P, credentials: Credentials, client_version: i32) -> Self {
        Self {
            processor,
            credentials,
            client_version,
            state: SessionState::Connected,
        }
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn require(&self, allowed: &[SessionState], operation: &str) -> AppResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(AppError::invalid_state(format!(
                "{operation} not allowed in state {}",
                self.state
            )))
        }
    }

    /// Fail unless the server speaks at least our protocol version.
    pub async fn check_version(&mut self) -> AppResult<i32> {
        self.require(&[SessionState::Connected], "GetVersion")?;
        let server = self.processor.get_version().await?;
        debug!(client = self.client_version, server, "Capture server version");
        if server < self.client_version {
            return Err(AppError::incompatible_version(self.client_version, server));
        }
        self.state = SessionState::VersionChecked;
        Ok(server)
    }

    /// Submit the company credentials.
    pub async fn verify_credentials(&mut self) -> AppResult<()> {
        self.require(&[SessionState::VersionChecked], "VerifyCredentials")?;
        self.processor
            .verify_credentials(&self.credentials)
            .await
            .map_err(|e| {
                if e.is_server_rejection() {
                    let message = format!(
                        "credentials for '{}' rejected: {e}",
                        self.credentials.company_name
                    );
                    AppError::with_source(ErrorKind::CredentialRejected, message, e)
                } else {
                    AppError::from(e)
                }
            })?;
        debug!(company = %self.credentials.company_name, "Credentials verified");
        self.state = SessionState::CredentialsVerified;
        Ok(())
    }

    /// Version check followed by credential verification.
    pub async fn handshake(&mut self) -> AppResult<i32> {
        let version = self.check_version().await?;
        self.verify_credentials().await?;
        Ok(version)
    }

    /// Open `event` on the server.
    pub async fn begin_event(&mut self, event: &Event) -> AppResult<OpenEvent> {
        self.require(&[SessionState::CredentialsVerified], "BeginEvent")?;
        let event_id = self
            .processor
            .begin_event(event, &self.credentials)
            .await?;
        debug!(event_id, "Event opened");
        self.state = SessionState::EventOpen;
        Ok(OpenEvent { event_id })
    }

    /// Open the stream for the data entry with local id `data_id`.
    pub async fn begin_stream(&mut self, event: &OpenEvent, data_id: i64) -> AppResult<OpenStream> {
        self.require(&[SessionState::EventOpen], "BeginStream")?;
        let stream_id = self.processor.begin_stream(event.event_id, data_id).await?;
        debug!(event_id = event.event_id, stream_id, data_id, "Stream opened");
        self.state = SessionState::StreamOpen;
        Ok(OpenStream {
            event_id: event.event_id,
            stream_id,
        })
    }

    /// Send stream content.
    pub async fn send_stream_data(&mut self, stream: &OpenStream, data: Bytes) -> AppResult<()> {
        self.require(&[SessionState::StreamOpen], "SendStreamData")?;
        let len = data.len();
        self.processor
            .send_stream_data(stream.event_id, stream.stream_id, data)
            .await?;
        debug!(
            event_id = stream.event_id,
            stream_id = stream.stream_id,
            bytes = len,
            "Stream data sent"
        );
        Ok(())
    }

    /// Close a stream. The stream counts as closed locally even if the
    /// server call fails.
    pub async fn end_stream(&mut self, stream: OpenStream) -> AppResult<()> {
        self.require(&[SessionState::StreamOpen], "EndStream")?;
        self.state = SessionState::EventOpen;
        self.processor
            .end_stream(stream.event_id, stream.stream_id)
            .await?;
        debug!(
            event_id = stream.event_id,
            stream_id = stream.stream_id,
            "Stream closed"
        );
        Ok(())
    }

    /// Database id (GUID) of the open event.
    pub async fn event_database_id(&mut self, event: &OpenEvent) -> AppResult<String> {
        self.require(&[SessionState::EventOpen], "GetEventDatabaseId")?;
        let guid = self.processor.get_event_database_id(event.event_id).await?;
        debug!(event_id = event.event_id, %guid, "Event database id");
        Ok(guid)
    }

    /// Finalize the event, committing it unless `abort` is set.
    pub async fn end_event(&mut self, event: OpenEvent, abort: bool) -> AppResult<()> {
        self.require(
            &[SessionState::EventOpen, SessionState::StreamOpen],
            "EndEvent",
        )?;
        self.state = SessionState::Finalizing;
        let result = self.processor.end_event(event.event_id, abort).await;
        self.state = if abort || result.is_err() {
            SessionState::Aborted
        } else {
            SessionState::Committed
        };
        debug!(event_id = event.event_id, abort, state = %self.state, "Event finalized");
        result.map_err(AppError::from)
    }

    /// Run the whole protocol for `event` and return its database id.
    ///
    /// `EndEvent` is called exactly once after a successful `BeginEvent`,
    /// with `abort` set if anything in between failed. The first failure is
    /// the one returned.
    pub async fn send_event(mut self, event: &Event) -> AppResult<String> {
        self.handshake().await?;
        let open = self.begin_event(event).await?;
        let event_id = open.id();

        match self.stream_and_identify(&open, event).await {
            Ok(guid) => {
                self.end_event(open, false).await?;
                info!(event_id, %guid, streams = event.data.len(), "Event committed");
                Ok(guid)
            }
            Err(err) => {
                if let Err(end_err) = self.end_event(open, true).await {
                    warn!(event_id, error = %end_err, "Aborting event failed");
                }
                Err(err)
            }
        }
    }

    async fn stream_and_identify(&mut self, open: &OpenEvent, event: &Event) -> AppResult<String> {
        for data in &event.data {
            self.transmit_stream(open, data).await?;
        }
        self.event_database_id(open).await
    }

    async fn transmit_stream(&mut self, open: &OpenEvent, data: &EventData) -> AppResult<()> {
        let stream = self.begin_stream(open, data.local_id).await?;
        let stream_id = stream.id();
        let sent = self.send_stream_data(&stream, data.content.clone()).await;
        let ended = self.end_stream(stream).await;
        match (sent, ended) {
            (Err(err), Err(end_err)) => {
                warn!(stream_id, error = %end_err, "Closing stream after failed send also failed");
                Err(err)
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}
