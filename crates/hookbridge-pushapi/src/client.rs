//! Thrift RPC client for the `EventProcessor` service.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, warn};

use crate::error::PushApiError;
use crate::processor::{EventId, EventProcessor, StreamId};
use crate::protocol::{BinaryReader, BinaryWriter, MessageType, TType};
use crate::types::{Credentials, Event};

type ReadFn<R> = fn(&mut BinaryReader) -> Result<R, PushApiError>;

/// PushAPI client over any framed byte stream.
///
/// Each call writes one framed message and waits for the matching reply
/// within the I/O timeout. A call that times out or reads a reply for a
/// different call leaves the stream out of step; every later call then
/// fails without touching the connection.
pub struct PushApiClient<T> {
    framed: Framed<T, LengthDelimitedCodec>,
    seq_id: i32,
    io_timeout: Duration,
    broken: Option<String>,
}

impl<T> std::fmt::Debug for PushApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushApiClient")
            .field("seq_id", &self.seq_id)
            .field("io_timeout", &self.io_timeout)
            .field("broken", &self.broken)
            .finish()
    }
}

impl<T> PushApiClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream. Frames larger than `max_frame_bytes` are
    /// refused in both directions.
    pub fn new(io: T, max_frame_bytes: usize, io_timeout: Duration) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .length_field_length(4)
            .big_endian()
            .max_frame_length(max_frame_bytes)
            .new_codec();
        Self {
            framed: Framed::new(io, codec),
            seq_id: 0,
            io_timeout,
            broken: None,
        }
    }

    /// Why the connection can no longer be used, if it can't.
    pub fn broken_reason(&self) -> Option<&str> {
        self.broken.as_deref()
    }

    /// Send a call and return a reader positioned at the result struct.
    async fn call(
        &mut self,
        method: &'static str,
        write_args: impl FnOnce(&mut BinaryWriter),
    ) -> Result<BinaryReader, PushApiError> {
        if let Some(reason) = &self.broken {
            return Err(PushApiError::Desynchronized(format!(
                "{method} refused, {reason}"
            )));
        }
        self.seq_id = self.seq_id.wrapping_add(1);
        let seq_id = self.seq_id;

        let mut w = BinaryWriter::new();
        w.write_message_begin(method, MessageType::Call, seq_id);
        write_args(&mut w);
        w.write_field_stop();
        let request = w.into_bytes();
        debug!(method, seq_id, bytes = request.len(), "PushAPI call");

        let frame =
            match tokio::time::timeout(self.io_timeout, Self::exchange(&mut self.framed, request))
                .await
            {
                Ok(frame) => frame?,
                Err(_) => {
                    warn!(method, seq_id, "PushAPI call timed out, connection abandoned");
                    self.broken = Some(format!("{method} (seq {seq_id}) timed out"));
                    return Err(PushApiError::Timeout(method.to_string()));
                }
            };

        let mut reader = BinaryReader::new(frame);
        let header = reader.read_message_begin()?;
        if header.name != method || header.seq_id != seq_id {
            self.broken = Some(format!(
                "{method} (seq {seq_id}) was answered by {} (seq {})",
                header.name, header.seq_id
            ));
        }
        if header.name != method {
            return Err(PushApiError::protocol(format!(
                "reply to {} received for {method}",
                header.name
            )));
        }
        if header.seq_id != seq_id {
            return Err(PushApiError::protocol(format!(
                "{method}: sequence id {} does not match {seq_id}",
                header.seq_id
            )));
        }

        match header.message_type {
            MessageType::Reply => Ok(reader),
            MessageType::Exception => {
                let (kind, message) = read_application_exception(&mut reader)?;
                Err(PushApiError::Application {
                    method: method.to_string(),
                    kind,
                    message,
                })
            }
            other => Err(PushApiError::protocol(format!(
                "{method}: unexpected message type {other:?}"
            ))),
        }
    }

    async fn exchange(
        framed: &mut Framed<T, LengthDelimitedCodec>,
        request: Bytes,
    ) -> Result<Bytes, PushApiError> {
        framed.send(request).await?;
        match framed.next().await {
            Some(frame) => Ok(frame?.freeze()),
            None => Err(PushApiError::ConnectionClosed),
        }
    }

    async fn call_value<R>(
        &mut self,
        method: &'static str,
        write_args: impl FnOnce(&mut BinaryWriter),
        expected: TType,
        read: ReadFn<R>,
    ) -> Result<R, PushApiError> {
        let mut reader = self.call(method, write_args).await?;
        read_result(&mut reader, method, Some((expected, read)))?
            .ok_or_else(|| PushApiError::MissingResult(method.to_string()))
    }

    async fn call_void(
        &mut self,
        method: &'static str,
        write_args: impl FnOnce(&mut BinaryWriter),
    ) -> Result<(), PushApiError> {
        let mut reader = self.call(method, write_args).await?;
        read_result::<()>(&mut reader, method, None)?;
        Ok(())
    }
}

/// Walk a `<method>_result` struct: field 0 is the return value, any other
/// struct field is a declared exception.
fn read_result<R>(
    reader: &mut BinaryReader,
    method: &str,
    success: Option<(TType, ReadFn<R>)>,
) -> Result<Option<R>, PushApiError> {
    let mut value = None;
    loop {
        let (ttype, id) = reader.read_field_begin()?;
        match (ttype, id) {
            (TType::Stop, _) => break,
            (_, 0) => match success {
                Some((expected, read)) if ttype == expected => value = Some(read(reader)?),
                Some((expected, _)) => {
                    return Err(PushApiError::protocol(format!(
                        "{method}: result has type {ttype:?}, expected {expected:?}"
                    )));
                }
                None => reader.skip(ttype)?,
            },
            (TType::Struct, _) => {
                let message = reader
                    .read_exception_message()?
                    .unwrap_or_else(|| format!("exception field {id}"));
                return Err(PushApiError::Server {
                    method: method.to_string(),
                    message,
                });
            }
            _ => reader.skip(ttype)?,
        }
    }
    Ok(value)
}

/// `TApplicationException { 1: message, 2: type }`.
fn read_application_exception(reader: &mut BinaryReader) -> Result<(i32, String), PushApiError> {
    let mut kind = 0;
    let mut message = String::new();
    loop {
        let (ttype, id) = reader.read_field_begin()?;
        match (ttype, id) {
            (TType::Stop, _) => break,
            (TType::String, 1) => message = reader.read_string()?,
            (TType::I32, 2) => kind = reader.read_i32()?,
            _ => reader.skip(ttype)?,
        }
    }
    Ok((kind, message))
}

#[async_trait]
impl<T> EventProcessor for PushApiClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn get_version(&mut self) -> Result<i32, PushApiError> {
        self.call_value("GetVersion", |_| {}, TType::I32, BinaryReader::read_i32)
            .await
    }

    async fn verify_credentials(&mut self, credentials: &Credentials) -> Result<(), PushApiError> {
        self.call_void("VerifyCredentials", |w| w.struct_field(1, credentials))
            .await
    }

    async fn begin_event(
        &mut self,
        event: &Event,
        credentials: &Credentials,
    ) -> Result<EventId, PushApiError> {
        self.call_value(
            "BeginEvent",
            |w| {
                w.struct_field(1, event);
                w.struct_field(2, credentials);
            },
            TType::I64,
            BinaryReader::read_i64,
        )
        .await
    }

    async fn begin_stream(
        &mut self,
        event_id: EventId,
        data_id: i64,
    ) -> Result<StreamId, PushApiError> {
        self.call_value(
            "BeginStream",
            |w| {
                w.i64_field(1, event_id);
                w.i64_field(2, data_id);
            },
            TType::I64,
            BinaryReader::read_i64,
        )
        .await
    }

    async fn send_stream_data(
        &mut self,
        event_id: EventId,
        stream_id: StreamId,
        data: Bytes,
    ) -> Result<(), PushApiError> {
        self.call_void("SendStreamData", |w| {
            w.i64_field(1, event_id);
            w.i64_field(2, stream_id);
            w.binary_field(3, &data);
        })
        .await
    }

    async fn end_stream(
        &mut self,
        event_id: EventId,
        stream_id: StreamId,
    ) -> Result<(), PushApiError> {
        self.call_void("EndStream", |w| {
            w.i64_field(1, event_id);
            w.i64_field(2, stream_id);
        })
        .await
    }

    async fn get_event_database_id(&mut self, event_id: EventId) -> Result<String, PushApiError> {
        self.call_value(
            "GetEventDatabaseId",
            |w| w.i64_field(1, event_id),
            TType::String,
            BinaryReader::read_string,
        )
        .await
    }

    async fn end_event(&mut self, event_id: EventId, abort: bool) -> Result<(), PushApiError> {
        self.call_void("EndEvent", |w| {
            w.i64_field(1, event_id);
            w.bool_field(2, abort);
        })
        .await
    }
}
