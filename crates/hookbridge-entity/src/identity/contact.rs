//! Contact records attached to identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of contact information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    /// Authenticated account login.
    Auth,
    /// E-mail address.
    Email,
    /// Skype login.
    Skype,
    /// ICQ number.
    Icq,
    /// DNS host name.
    Hostname,
}

impl ContactKind {
    /// Contact type name as transmitted to the capture server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Email => "email",
            Self::Skype => "skype",
            Self::Icq => "icq",
            Self::Hostname => "dnshostname",
        }
    }
}

impl fmt::Display for ContactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContactKind {
    type Err = hookbridge_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "email" => Ok(Self::Email),
            "skype" => Ok(Self::Skype),
            "icq" => Ok(Self::Icq),
            "dnshostname" | "hostname" => Ok(Self::Hostname),
            _ => Err(hookbridge_core::AppError::invalid_field(
                "contact_type",
                format!("'{s}', expected one of: auth, email, skype, icq, hostname"),
            )),
        }
    }
}

/// One piece of contact information with optional free-form metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact type.
    pub kind: ContactKind,
    /// Contact value (login, address, host name, ...).
    pub value: String,
    /// Additional information about the contact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl Contact {
    /// Create a contact without metadata.
    pub fn new(kind: ContactKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            meta: None,
        }
    }

    /// Create a contact carrying metadata.
    pub fn with_meta(kind: ContactKind, value: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            meta: Some(meta.into()),
        }
    }

    /// Skype contact.
    pub fn skype(value: impl Into<String>) -> Self {
        Self::new(ContactKind::Skype, value)
    }

    /// E-mail contact.
    pub fn email(value: impl Into<String>) -> Self {
        Self::new(ContactKind::Email, value)
    }

    /// Authenticated-login contact.
    pub fn auth(value: impl Into<String>) -> Self {
        Self::new(ContactKind::Auth, value)
    }

    /// ICQ contact.
    pub fn icq(value: impl Into<String>) -> Self {
        Self::new(ContactKind::Icq, value)
    }

    /// Host name contact.
    pub fn hostname(value: impl Into<String>) -> Self {
        Self::new(ContactKind::Hostname, value)
    }
}
