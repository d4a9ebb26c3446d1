//! Thrift binary protocol encoding and decoding.
//!
//! Messages are written with strict (versioned) headers; both strict and
//! legacy headers are accepted when reading. Framing is handled by the
//! transport, so a reader always works on one complete frame.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::PushApiError;

/// Strict header version marker.
pub const VERSION_1: u32 = 0x8001_0000;
const VERSION_MASK: u32 = 0xffff_0000;
const MAX_SKIP_DEPTH: usize = 64;

/// Thrift wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TType {
    /// End of struct marker.
    Stop = 0,
    /// Boolean.
    Bool = 2,
    /// Signed byte.
    Byte = 3,
    /// 64-bit float.
    Double = 4,
    /// 16-bit integer.
    I16 = 6,
    /// 32-bit integer.
    I32 = 8,
    /// 64-bit integer.
    I64 = 10,
    /// String or binary.
    String = 11,
    /// Nested struct.
    Struct = 12,
    /// Map.
    Map = 13,
    /// Set.
    Set = 14,
    /// List.
    List = 15,
}

impl TryFrom<u8> for TType {
    type Error = PushApiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Stop,
            2 => Self::Bool,
            3 => Self::Byte,
            4 => Self::Double,
            6 => Self::I16,
            8 => Self::I32,
            10 => Self::I64,
            11 => Self::String,
            12 => Self::Struct,
            13 => Self::Map,
            14 => Self::Set,
            15 => Self::List,
            other => return Err(PushApiError::protocol(format!("unknown type id {other}"))),
        })
    }
}

/// Thrift message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Client request.
    Call = 1,
    /// Normal reply.
    Reply = 2,
    /// `TApplicationException` reply.
    Exception = 3,
    /// Request without reply.
    Oneway = 4,
}

impl TryFrom<u8> for MessageType {
    type Error = PushApiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Call,
            2 => Self::Reply,
            3 => Self::Exception,
            4 => Self::Oneway,
            other => {
                return Err(PushApiError::protocol(format!(
                    "unknown message type {other}"
                )));
            }
        })
    }
}

/// Decoded message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Method name.
    pub name: String,
    /// Message type.
    pub message_type: MessageType,
    /// Sequence id echoed by the server.
    pub seq_id: i32,
}

/// A value that serializes itself as a Thrift struct.
pub trait ThriftEncode {
    /// Write the struct's fields followed by the stop marker.
    fn encode(&self, w: &mut BinaryWriter);
}

/// Builds one binary-protocol message in memory.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: BytesMut,
}

impl BinaryWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict message header.
    pub fn write_message_begin(&mut self, name: &str, message_type: MessageType, seq_id: i32) {
        self.buf.put_u32(VERSION_1 | message_type as u32);
        self.write_string(name);
        self.buf.put_i32(seq_id);
    }

    /// Field header.
    pub fn write_field_begin(&mut self, ttype: TType, id: i16) {
        self.buf.put_u8(ttype as u8);
        self.buf.put_i16(id);
    }

    /// Struct terminator.
    pub fn write_field_stop(&mut self) {
        self.buf.put_u8(TType::Stop as u8);
    }

    /// List header.
    pub fn write_list_begin(&mut self, element: TType, len: usize) {
        self.buf.put_u8(element as u8);
        self.buf.put_i32(len as i32);
    }

    /// Boolean value.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// 32-bit value.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// 64-bit value.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    /// UTF-8 string.
    pub fn write_string(&mut self, value: &str) {
        self.write_binary(value.as_bytes());
    }

    /// Length-prefixed bytes.
    pub fn write_binary(&mut self, value: &[u8]) {
        self.buf.put_i32(value.len() as i32);
        self.buf.put_slice(value);
    }

    /// `bool` field.
    pub fn bool_field(&mut self, id: i16, value: bool) {
        self.write_field_begin(TType::Bool, id);
        self.write_bool(value);
    }

    /// `i32` field.
    pub fn i32_field(&mut self, id: i16, value: i32) {
        self.write_field_begin(TType::I32, id);
        self.write_i32(value);
    }

    /// `i64` field.
    pub fn i64_field(&mut self, id: i16, value: i64) {
        self.write_field_begin(TType::I64, id);
        self.write_i64(value);
    }

    /// `string` field.
    pub fn string_field(&mut self, id: i16, value: &str) {
        self.write_field_begin(TType::String, id);
        self.write_string(value);
    }

    /// `binary` field.
    pub fn binary_field(&mut self, id: i16, value: &[u8]) {
        self.write_field_begin(TType::String, id);
        self.write_binary(value);
    }

    /// Nested struct field.
    pub fn struct_field<T: ThriftEncode + ?Sized>(&mut self, id: i16, value: &T) {
        self.write_field_begin(TType::Struct, id);
        value.encode(self);
    }

    /// `list<struct>` field.
    pub fn struct_list_field<T: ThriftEncode>(&mut self, id: i16, values: &[T]) {
        self.write_field_begin(TType::List, id);
        self.write_list_begin(TType::Struct, values.len());
        for value in values {
            value.encode(self);
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish and return the encoded message.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Reads binary-protocol values from one received frame.
#[derive(Debug)]
pub struct BinaryReader {
    buf: Bytes,
}

impl BinaryReader {
    /// Wrap a complete frame.
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Bytes left unread.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, n: usize) -> Result<(), PushApiError> {
        if self.buf.remaining() < n {
            return Err(PushApiError::protocol(format!(
                "unexpected end of frame: need {n} bytes, have {}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    /// Message header, strict or legacy.
    pub fn read_message_begin(&mut self) -> Result<MessageHeader, PushApiError> {
        let first = self.read_i32()?;
        if first < 0 {
            let word = first as u32;
            if word & VERSION_MASK != VERSION_1 {
                return Err(PushApiError::protocol(format!(
                    "bad protocol version {:#010x}",
                    word & VERSION_MASK
                )));
            }
            let message_type = MessageType::try_from((word & 0xff) as u8)?;
            let name = self.read_string()?;
            let seq_id = self.read_i32()?;
            Ok(MessageHeader {
                name,
                message_type,
                seq_id,
            })
        } else {
            let name = self.read_sized_string(first)?;
            let message_type = MessageType::try_from(self.read_byte()? as u8)?;
            let seq_id = self.read_i32()?;
            Ok(MessageHeader {
                name,
                message_type,
                seq_id,
            })
        }
    }

    /// Field header; `(TType::Stop, 0)` at the end of a struct.
    pub fn read_field_begin(&mut self) -> Result<(TType, i16), PushApiError> {
        let ttype = TType::try_from(self.read_byte()? as u8)?;
        if ttype == TType::Stop {
            return Ok((ttype, 0));
        }
        let id = self.read_i16()?;
        Ok((ttype, id))
    }

    /// List or set header.
    pub fn read_list_begin(&mut self) -> Result<(TType, usize), PushApiError> {
        let element = TType::try_from(self.read_byte()? as u8)?;
        let len = self.read_len()?;
        Ok((element, len))
    }

    /// Map header.
    pub fn read_map_begin(&mut self) -> Result<(TType, TType, usize), PushApiError> {
        let key = TType::try_from(self.read_byte()? as u8)?;
        let value = TType::try_from(self.read_byte()? as u8)?;
        let len = self.read_len()?;
        Ok((key, value, len))
    }

    /// Boolean value.
    pub fn read_bool(&mut self) -> Result<bool, PushApiError> {
        Ok(self.read_byte()? != 0)
    }

    /// Signed byte.
    pub fn read_byte(&mut self) -> Result<i8, PushApiError> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    /// 16-bit value.
    pub fn read_i16(&mut self) -> Result<i16, PushApiError> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    /// 32-bit value.
    pub fn read_i32(&mut self) -> Result<i32, PushApiError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    /// 64-bit value.
    pub fn read_i64(&mut self) -> Result<i64, PushApiError> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    /// 64-bit float.
    pub fn read_double(&mut self) -> Result<f64, PushApiError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    /// Length-prefixed bytes.
    pub fn read_binary(&mut self) -> Result<Bytes, PushApiError> {
        let len = self.read_len()?;
        self.ensure(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    /// UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, PushApiError> {
        let len = self.read_i32()?;
        self.read_sized_string(len)
    }

    fn read_sized_string(&mut self, len: i32) -> Result<String, PushApiError> {
        let len = usize::try_from(len)
            .map_err(|_| PushApiError::protocol(format!("negative length {len}")))?;
        self.ensure(len)?;
        let raw = self.buf.copy_to_bytes(len);
        String::from_utf8(raw.to_vec())
            .map_err(|e| PushApiError::protocol(format!("invalid UTF-8 string: {e}")))
    }

    fn read_len(&mut self) -> Result<usize, PushApiError> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| PushApiError::protocol(format!("negative length {len}")))
    }

    /// Skip one value of the given type, including nested containers.
    pub fn skip(&mut self, ttype: TType) -> Result<(), PushApiError> {
        self.skip_depth(ttype, 0)
    }

    fn skip_depth(&mut self, ttype: TType, depth: usize) -> Result<(), PushApiError> {
        if depth > MAX_SKIP_DEPTH {
            return Err(PushApiError::protocol("value nested too deeply"));
        }
        match ttype {
            TType::Stop => return Err(PushApiError::protocol("cannot skip a stop marker")),
            TType::Bool | TType::Byte => {
                self.read_byte()?;
            }
            TType::I16 => {
                self.read_i16()?;
            }
            TType::I32 => {
                self.read_i32()?;
            }
            TType::I64 | TType::Double => {
                self.read_i64()?;
            }
            TType::String => {
                self.read_binary()?;
            }
            TType::Struct => loop {
                let (field_type, _) = self.read_field_begin()?;
                if field_type == TType::Stop {
                    break;
                }
                self.skip_depth(field_type, depth + 1)?;
            },
            TType::Map => {
                let (key, value, len) = self.read_map_begin()?;
                for _ in 0..len {
                    self.skip_depth(key, depth + 1)?;
                    self.skip_depth(value, depth + 1)?;
                }
            }
            TType::Set | TType::List => {
                let (element, len) = self.read_list_begin()?;
                for _ in 0..len {
                    self.skip_depth(element, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    /// Read a struct and return the first string field, the convention for
    /// the `message` of exception structs.
    pub fn read_exception_message(&mut self) -> Result<Option<String>, PushApiError> {
        let mut message = None;
        loop {
            let (ttype, _) = self.read_field_begin()?;
            match ttype {
                TType::Stop => break,
                TType::String if message.is_none() => message = Some(self.read_string()?),
                other => self.skip(other)?,
            }
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_header_layout() {
        let mut w = BinaryWriter::new();
        w.write_message_begin("GetVersion", MessageType::Call, 7);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &[0x80, 0x01, 0x00, 0x01]);
        assert_eq!(&bytes[4..8], &10i32.to_be_bytes());
        assert_eq!(&bytes[8..18], b"GetVersion");
        assert_eq!(&bytes[18..], &7i32.to_be_bytes());
    }

    #[test]
    fn test_reads_strict_and_legacy_headers() {
        let mut w = BinaryWriter::new();
        w.write_message_begin("EndEvent", MessageType::Reply, 3);
        let header = BinaryReader::new(w.into_bytes())
            .read_message_begin()
            .unwrap();
        assert_eq!(header.name, "EndEvent");
        assert_eq!(header.message_type, MessageType::Reply);
        assert_eq!(header.seq_id, 3);

        let mut legacy = BytesMut::new();
        legacy.put_i32(8);
        legacy.put_slice(b"EndEvent");
        legacy.put_u8(MessageType::Exception as u8);
        legacy.put_i32(4);
        let header = BinaryReader::new(legacy.freeze())
            .read_message_begin()
            .unwrap();
        assert_eq!(header.message_type, MessageType::Exception);
        assert_eq!(header.seq_id, 4);
    }

    #[test]
    fn test_skip_nested_values() {
        let mut w = BinaryWriter::new();
        // struct { 1: list<i64> [1, 2], 2: struct { 1: string "x" } } then an i32 sentinel
        w.write_field_begin(TType::List, 1);
        w.write_list_begin(TType::I64, 2);
        w.write_i64(1);
        w.write_i64(2);
        w.write_field_begin(TType::Struct, 2);
        w.string_field(1, "x");
        w.write_field_stop();
        w.write_field_stop();
        w.write_i32(42);

        let mut r = BinaryReader::new(w.into_bytes());
        r.skip(TType::Struct).unwrap();
        assert_eq!(r.read_i32().unwrap(), 42);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_truncated_frame_is_protocol_error() {
        let mut r = BinaryReader::new(Bytes::from_static(&[0x00, 0x00]));
        let err = r.read_i32().unwrap_err();
        assert!(matches!(err, PushApiError::Protocol(_)));
    }

    #[test]
    fn test_negative_string_length_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i32(-5);
        let err = BinaryReader::new(buf.freeze()).read_string().unwrap_err();
        assert!(err.to_string().contains("negative length"));
    }

    #[test]
    fn test_exception_message_takes_first_string() {
        let mut w = BinaryWriter::new();
        w.i32_field(2, 5);
        w.string_field(1, "bad token");
        w.string_field(3, "ignored");
        w.write_field_stop();
        let msg = BinaryReader::new(w.into_bytes())
            .read_exception_message()
            .unwrap();
        assert_eq!(msg.as_deref(), Some("bad token"));
    }
}
