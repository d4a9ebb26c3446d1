//! Protocol constants shared with the capture server.

use hookbridge_entity::{EventClass, IdentityKind};

/// Protocol version implemented by this client. Servers reporting a lower
/// version are refused.
pub const PROTOCOL_VERSION: i32 = 1;

/// Capture time, `YYYY-MM-DDThh:mm:ss[+-]hh:mm`.
pub const EVENT_ATTR_CAPTURE_DATE: &str = "capture_date";
/// Address of the capturing host.
pub const EVENT_ATTR_CAPTURE_SERVER_IP: &str = "capture_server_ip";
/// Fully qualified name of the capturing host.
pub const EVENT_ATTR_CAPTURE_SERVER_FQDN: &str = "capture_server_fqdn";
/// Optional human-readable event name.
pub const EVENT_ATTR_EVENT_NAME: &str = "event_name";
/// File name of a data stream.
pub const DATA_ATTR_FILENAME: &str = "filename";

/// Skype instant messaging service.
pub const SERVICE_IM_SKYPE: &str = "im_skype";

/// Wire value of an event class.
pub fn event_class_code(class: EventClass) -> i32 {
    match class {
        EventClass::Chat => 0,
        EventClass::FileExchange => 1,
    }
}

/// Wire value of an identity kind. Computers travel as workstations.
pub fn identity_kind_code(kind: IdentityKind) -> i32 {
    match kind {
        IdentityKind::Person => 0,
        IdentityKind::Computer => 1,
        IdentityKind::Device => 2,
        IdentityKind::Resource => 3,
    }
}
