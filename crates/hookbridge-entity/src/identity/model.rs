//! Identity model: a named party of an event.

use serde::{Deserialize, Serialize};
use std::fmt;

use hookbridge_core::error::AppError;
use hookbridge_core::result::AppResult;

use super::contact::{Contact, ContactKind};
use super::sequence::IdSequence;
use crate::attribute::Attribute;

/// Workstation-type attribute carried by computer identities.
pub const ATTR_WS_TYPE: &str = "ws_type";
/// `ws_type` value for computers.
pub const WS_TYPE_COMPUTER: &str = "computer";
/// Mandatory device name attribute.
pub const ATTR_DEVICE_NAME: &str = "device_name";
/// Mandatory resource domain attribute.
pub const ATTR_RESOURCE_ADDRESS: &str = "resource_address";
/// Mandatory resource path attribute.
pub const ATTR_RESOURCE_URL: &str = "resource_url";

/// Kind of party an identity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// A person.
    Person,
    /// A computer (transmitted as a workstation).
    Computer,
    /// A device such as a phone or a USB drive.
    Device,
    /// A web resource.
    Resource,
}

impl IdentityKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Computer => "computer",
            Self::Device => "device",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sender or receiver of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Id unique within the event, allocated at construction.
    pub local_id: i64,
    /// Kind of party.
    pub kind: IdentityKind,
    /// Contacts of the party.
    pub contacts: Vec<Contact>,
    /// Attributes of the party. Always empty for persons.
    pub attributes: Vec<Attribute>,
}

impl Identity {
    fn new(
        ids: &IdSequence,
        kind: IdentityKind,
        contacts: Vec<Contact>,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            local_id: ids.next_id(),
            kind,
            contacts,
            attributes,
        }
    }

    /// A person identified by the given contacts.
    pub fn person(ids: &IdSequence, contacts: Vec<Contact>) -> Self {
        Self::new(ids, IdentityKind::Person, contacts, Vec::new())
    }

    /// A person with a single Skype contact.
    pub fn skype_person(ids: &IdSequence, skype_id: impl Into<String>) -> Self {
        Self::person(ids, vec![Contact::skype(skype_id)])
    }

    /// A person with a single e-mail contact.
    pub fn email_person(ids: &IdSequence, email: impl Into<String>) -> Self {
        Self::person(ids, vec![Contact::email(email)])
    }

    /// A person with an account login and an e-mail address.
    pub fn auth_person(ids: &IdSequence, login: impl Into<String>, email: impl Into<String>) -> Self {
        Self::person(ids, vec![Contact::auth(login), Contact::email(email)])
    }

    /// A computer. A host name, when given, is added as a contact.
    pub fn computer(
        ids: &IdSequence,
        host_name: Option<&str>,
        mut contacts: Vec<Contact>,
        mut attributes: Vec<Attribute>,
    ) -> Self {
        if let Some(name) = host_name.filter(|n| !n.is_empty()) {
            contacts.push(Contact::hostname(name));
        }
        attributes.push(Attribute::new(ATTR_WS_TYPE, WS_TYPE_COMPUTER));
        Self::new(ids, IdentityKind::Computer, contacts, attributes)
    }

    /// A device. The name is mandatory.
    pub fn device(
        ids: &IdSequence,
        name: &str,
        contacts: Vec<Contact>,
        mut attributes: Vec<Attribute>,
    ) -> AppResult<Self> {
        if name.is_empty() {
            return Err(AppError::invalid_field(
                ATTR_DEVICE_NAME,
                "device name must not be empty",
            ));
        }
        attributes.push(Attribute::new(ATTR_DEVICE_NAME, name));
        Ok(Self::new(ids, IdentityKind::Device, contacts, attributes))
    }

    /// A web resource at `path` on `domain_name`.
    pub fn resource(
        ids: &IdSequence,
        domain_name: &str,
        path: &str,
        contacts: Vec<Contact>,
        extra: Vec<Attribute>,
    ) -> Self {
        let mut attributes = vec![
            Attribute::new(ATTR_RESOURCE_ADDRESS, domain_name),
            Attribute::new(ATTR_RESOURCE_URL, path),
        ];
        attributes.extend(extra);
        Self::new(ids, IdentityKind::Resource, contacts, attributes)
    }

    /// Append a contact.
    pub fn add_contact(&mut self, kind: ContactKind, value: impl Into<String>, meta: Option<String>) {
        self.contacts.push(Contact {
            kind,
            value: value.into(),
            meta,
        });
    }

    /// First contact value, used as a display label.
    pub fn label(&self) -> Option<&str> {
        self.contacts.first().map(|c| c.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_construction_order() {
        let ids = IdSequence::new();
        let a = Identity::skype_person(&ids, "alice");
        let b = Identity::email_person(&ids, "bob@example.com");
        assert_eq!(a.local_id, 1);
        assert_eq!(b.local_id, 2);
        assert!(a.attributes.is_empty());
        assert_eq!(a.label(), Some("alice"));
    }

    #[test]
    fn test_computer_carries_hostname_and_ws_type() {
        let ids = IdSequence::new();
        let pc = Identity::computer(&ids, Some("ws-01.corp"), Vec::new(), Vec::new());
        assert_eq!(pc.kind, IdentityKind::Computer);
        assert_eq!(pc.contacts, vec![Contact::hostname("ws-01.corp")]);
        assert_eq!(
            pc.attributes,
            vec![Attribute::new(ATTR_WS_TYPE, WS_TYPE_COMPUTER)]
        );
    }

    #[test]
    fn test_device_requires_name() {
        let ids = IdSequence::new();
        assert!(Identity::device(&ids, "", Vec::new(), Vec::new()).is_err());
        let dev = Identity::device(&ids, "usb-stick", Vec::new(), Vec::new()).unwrap();
        assert_eq!(dev.attributes[0].value, "usb-stick");
    }

    #[test]
    fn test_resource_mandatory_attributes_come_first() {
        let ids = IdSequence::new();
        let res = Identity::resource(
            &ids,
            "cloud.example.com",
            "/s/abc",
            Vec::new(),
            vec![Attribute::new("note", "x")],
        );
        let names: Vec<_> = res.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec![ATTR_RESOURCE_ADDRESS, ATTR_RESOURCE_URL, "note"]);
    }

    #[test]
    fn test_add_contact() {
        let ids = IdSequence::new();
        let mut p = Identity::person(&ids, Vec::new());
        p.add_contact(ContactKind::Icq, "123456", Some("home".to_string()));
        assert_eq!(p.contacts[0].meta.as_deref(), Some("home"));
    }
}
