//! Wire-level structures of the PushAPI service.
//!
//! Field ids:
//!
//! | struct | fields |
//! |---|---|
//! | `Attribute` | 1 name, 2 value |
//! | `ContactWithMeta` | 1 contact (`Attribute` of kind and value), 2 meta (optional) |
//! | `Identity` | 1 id, 2 type, 3 contacts (legacy), 4 attributes, 5 contacts with meta |
//! | `EventData` | 1 id, 2 attributes |
//! | `ChatMessage` | 1 sender id, 2 sent time, 3 text, 4 data id (optional) |
//! | `Event` | 1 class, 2 service, 3 attributes, 4 senders, 5 receivers, 6 data, 7 messages |
//! | `Credentials` | 1 company name, 2 token |
//!
//! Data stream content is not part of `EventData` on the wire; it travels
//! through `SendStreamData`.

use bytes::Bytes;
use std::fmt;

use hookbridge_entity::{Attribute, Contact, EventClass, Identity};

use crate::constants::{
    DATA_ATTR_FILENAME, EVENT_ATTR_EVENT_NAME, event_class_code, identity_kind_code,
};
use crate::protocol::{BinaryWriter, TType, ThriftEncode};

/// Company credentials checked by the capture server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Company name registered on the server.
    pub company_name: String,
    /// Access token.
    pub token: String,
}

impl Credentials {
    /// Build credentials.
    pub fn new(company_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("company_name", &self.company_name)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl ThriftEncode for Credentials {
    fn encode(&self, w: &mut BinaryWriter) {
        w.string_field(1, &self.company_name);
        w.string_field(2, &self.token);
        w.write_field_stop();
    }
}

/// One data stream attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventData {
    /// Local id, unique within the event.
    pub local_id: i64,
    /// Stream content, sent in one `SendStreamData` call.
    pub content: Bytes,
    /// Stream attributes.
    pub attributes: Vec<Attribute>,
}

impl EventData {
    /// File name carried in the `filename` attribute, if any.
    pub fn filename(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == DATA_ATTR_FILENAME)
            .map(|a| a.value.as_str())
    }
}

impl ThriftEncode for EventData {
    fn encode(&self, w: &mut BinaryWriter) {
        w.i64_field(1, self.local_id);
        w.struct_list_field(2, &self.attributes);
        w.write_field_stop();
    }
}

/// A chat message with its sender resolved to a local id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Local id of the sending identity.
    pub sender_id: i64,
    /// `YYYY-MM-DDThh:mm:ss[+-]hh:mm`.
    pub sent_time: String,
    /// Message text.
    pub text: String,
    /// Data stream holding the text, if any.
    pub data_id: Option<i64>,
}

impl ThriftEncode for ChatMessage {
    fn encode(&self, w: &mut BinaryWriter) {
        w.i64_field(1, self.sender_id);
        w.string_field(2, &self.sent_time);
        w.string_field(3, &self.text);
        if let Some(data_id) = self.data_id {
            w.i64_field(4, data_id);
        }
        w.write_field_stop();
    }
}

/// A fully assembled event, ready for `BeginEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event class.
    pub class: EventClass,
    /// Service name, e.g. `im_skype`.
    pub service: String,
    /// Capture attributes followed by the optional event name.
    pub attributes: Vec<Attribute>,
    /// Senders in order.
    pub senders: Vec<Identity>,
    /// Receivers in order.
    pub receivers: Vec<Identity>,
    /// Data streams.
    pub data: Vec<EventData>,
    /// Chat messages.
    pub messages: Vec<ChatMessage>,
}

impl Event {
    /// Empty event of the given class.
    pub fn new(class: EventClass, service: impl Into<String>) -> Self {
        Self {
            class,
            service: service.into(),
            attributes: Vec::new(),
            senders: Vec::new(),
            receivers: Vec::new(),
            data: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Value of the first attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// The `event_name` attribute, if present.
    pub fn name(&self) -> Option<&str> {
        self.attribute(EVENT_ATTR_EVENT_NAME)
    }
}

impl ThriftEncode for Event {
    fn encode(&self, w: &mut BinaryWriter) {
        w.i32_field(1, event_class_code(self.class));
        w.string_field(2, &self.service);
        w.struct_list_field(3, &self.attributes);
        w.struct_list_field(4, &self.senders);
        w.struct_list_field(5, &self.receivers);
        w.struct_list_field(6, &self.data);
        w.struct_list_field(7, &self.messages);
        w.write_field_stop();
    }
}

impl ThriftEncode for Attribute {
    fn encode(&self, w: &mut BinaryWriter) {
        w.string_field(1, &self.name);
        w.string_field(2, &self.value);
        w.write_field_stop();
    }
}

impl ThriftEncode for Contact {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_field_begin(TType::Struct, 1);
        w.string_field(1, self.kind.as_str());
        w.string_field(2, &self.value);
        w.write_field_stop();
        if let Some(meta) = &self.meta {
            w.string_field(2, meta);
        }
        w.write_field_stop();
    }
}

impl ThriftEncode for Identity {
    fn encode(&self, w: &mut BinaryWriter) {
        w.i64_field(1, self.local_id);
        w.i32_field(2, identity_kind_code(self.kind));
        // Field 3 predates contact metadata; servers read field 5.
        w.struct_list_field::<Attribute>(3, &[]);
        w.struct_list_field(4, &self.attributes);
        if !self.contacts.is_empty() {
            w.struct_list_field(5, &self.contacts);
        }
        w.write_field_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::BinaryReader;
    use hookbridge_entity::IdSequence;

    fn encoded<T: ThriftEncode>(value: &T) -> BinaryReader {
        let mut w = BinaryWriter::new();
        value.encode(&mut w);
        BinaryReader::new(w.into_bytes())
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = Credentials::new("acme", "s3cret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("acme"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_attribute_layout() {
        let mut r = encoded(&Attribute::new("filename", "a.txt"));
        assert_eq!(r.read_field_begin().unwrap(), (TType::String, 1));
        assert_eq!(r.read_string().unwrap(), "filename");
        assert_eq!(r.read_field_begin().unwrap(), (TType::String, 2));
        assert_eq!(r.read_string().unwrap(), "a.txt");
        assert_eq!(r.read_field_begin().unwrap().0, TType::Stop);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_identity_layout() {
        let ids = IdSequence::new();
        let person = Identity::skype_person(&ids, "alice");
        let mut r = encoded(&person);

        assert_eq!(r.read_field_begin().unwrap(), (TType::I64, 1));
        assert_eq!(r.read_i64().unwrap(), 1);
        assert_eq!(r.read_field_begin().unwrap(), (TType::I32, 2));
        assert_eq!(r.read_i32().unwrap(), 0);
        assert_eq!(r.read_field_begin().unwrap(), (TType::List, 3));
        assert_eq!(r.read_list_begin().unwrap(), (TType::Struct, 0));
        assert_eq!(r.read_field_begin().unwrap(), (TType::List, 4));
        assert_eq!(r.read_list_begin().unwrap(), (TType::Struct, 0));
        assert_eq!(r.read_field_begin().unwrap(), (TType::List, 5));
        assert_eq!(r.read_list_begin().unwrap(), (TType::Struct, 1));

        // ContactWithMeta { 1: Attribute("skype", "alice") }
        assert_eq!(r.read_field_begin().unwrap(), (TType::Struct, 1));
        assert_eq!(r.read_field_begin().unwrap(), (TType::String, 1));
        assert_eq!(r.read_string().unwrap(), "skype");
        assert_eq!(r.read_field_begin().unwrap(), (TType::String, 2));
        assert_eq!(r.read_string().unwrap(), "alice");
        assert_eq!(r.read_field_begin().unwrap().0, TType::Stop);
        assert_eq!(r.read_field_begin().unwrap().0, TType::Stop);

        assert_eq!(r.read_field_begin().unwrap().0, TType::Stop);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_chat_message_optional_data_id() {
        let msg = ChatMessage {
            sender_id: 3,
            sent_time: "2022-10-26T13:18:52+03:00".into(),
            text: "hi".into(),
            data_id: None,
        };
        assert_eq!(field_ids(&mut encoded(&msg)), vec![1, 2, 3]);

        let with_data = ChatMessage {
            data_id: Some(9),
            ..msg
        };
        assert_eq!(field_ids(&mut encoded(&with_data)), vec![1, 2, 3, 4]);
    }

    fn field_ids(r: &mut BinaryReader) -> Vec<i16> {
        let mut ids = Vec::new();
        loop {
            let (ttype, id) = r.read_field_begin().unwrap();
            if ttype == TType::Stop {
                break;
            }
            ids.push(id);
            r.skip(ttype).unwrap();
        }
        ids
    }

    #[test]
    fn test_event_data_omits_content() {
        let data = EventData {
            local_id: 4,
            content: Bytes::from_static(b"payload bytes"),
            attributes: vec![Attribute::new(DATA_ATTR_FILENAME, "a.bin")],
        };
        assert_eq!(data.filename(), Some("a.bin"));
        let mut w = BinaryWriter::new();
        data.encode(&mut w);
        let bytes = w.into_bytes();
        assert!(!bytes.windows(13).any(|win| win == b"payload bytes"));
    }

    #[test]
    fn test_event_field_order() {
        let mut event = Event::new(EventClass::FileExchange, "im_skype");
        event
            .attributes
            .push(Attribute::new(EVENT_ATTR_EVENT_NAME, "upload"));
        assert_eq!(event.name(), Some("upload"));

        let mut r = encoded(&event);
        assert_eq!(r.read_field_begin().unwrap(), (TType::I32, 1));
        assert_eq!(r.read_i32().unwrap(), 1);
        assert_eq!(field_ids(&mut r), vec![2, 3, 4, 5, 6, 7]);
    }
}
