//! Unified application error types for HookBridge.
//!
//! Mapping, assembly, and transmission errors are all expressed as an
//! [`AppError`] carrying an [`ErrorKind`], so the webhook boundary can log
//! them uniformly and still acknowledge the sender.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A required payload field is absent or null.
    MissingField,
    /// A payload field is present but has the wrong shape.
    InvalidField,
    /// The webhook discriminator is not one of the known request types.
    UnrecognizedRequestType,
    /// A chat message refers to a sender that does not exist.
    IndexOutOfRange,
    /// The capture server speaks an older protocol than this client.
    IncompatibleVersion,
    /// The capture server rejected the configured credentials.
    CredentialRejected,
    /// A failure after an event was opened on the capture server.
    Transmission,
    /// A session operation was called out of protocol order.
    InvalidState,
    /// Connection, TLS, or socket I/O failure.
    Transport,
    /// Malformed or unexpected RPC frame.
    Protocol,
    /// A configuration error occurred.
    Configuration,
    /// A local file I/O error occurred.
    Storage,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An external service error occurred.
    ExternalService,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => write!(f, "MISSING_FIELD"),
            Self::InvalidField => write!(f, "INVALID_FIELD"),
            Self::UnrecognizedRequestType => write!(f, "UNRECOGNIZED_REQUEST_TYPE"),
            Self::IndexOutOfRange => write!(f, "INDEX_OUT_OF_RANGE"),
            Self::IncompatibleVersion => write!(f, "INCOMPATIBLE_VERSION"),
            Self::CredentialRejected => write!(f, "CREDENTIAL_REJECTED"),
            Self::Transmission => write!(f, "TRANSMISSION"),
            Self::InvalidState => write!(f, "INVALID_STATE"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Protocol => write!(f, "PROTOCOL"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout HookBridge.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a missing-field error naming the absent key.
    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorKind::MissingField, format!("missing field '{field}'"))
    }

    /// Create an invalid-field error.
    pub fn invalid_field(field: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidField,
            format!("invalid field '{field}': {reason}"),
        )
    }

    /// Create an unrecognized-request-type error.
    pub fn unrecognized_request_type(request_type: &str) -> Self {
        Self::new(
            ErrorKind::UnrecognizedRequestType,
            format!("unrecognized request type '{request_type}'"),
        )
    }

    /// Create an index-out-of-range error.
    pub fn index_out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexOutOfRange, message)
    }

    /// Create an incompatible-version error.
    pub fn incompatible_version(client: i32, server: i32) -> Self {
        Self::new(
            ErrorKind::IncompatibleVersion,
            format!("incompatible version: client: {client}, server: {server}"),
        )
    }

    /// Create a credential-rejected error.
    pub fn credential_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialRejected, message)
    }

    /// Create a transmission error.
    pub fn transmission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transmission, message)
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error was produced while translating the webhook payload.
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MissingField | ErrorKind::InvalidField | ErrorKind::UnrecognizedRequestType
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
