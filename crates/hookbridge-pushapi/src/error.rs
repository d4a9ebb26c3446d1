//! PushAPI client errors.

use thiserror::Error;

use hookbridge_core::error::{AppError, ErrorKind};

/// Errors raised while talking to the capture server.
#[derive(Debug, Error)]
pub enum PushApiError {
    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration or handshake failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The operation did not finish within its deadline.
    #[error("timed out during {0}")]
    Timeout(String),

    /// An earlier call left the connection out of step with the server.
    #[error("connection unusable: {0}")]
    Desynchronized(String),

    /// The server closed the connection while a reply was expected.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// A frame could not be decoded or did not match the call.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered with a Thrift application exception.
    #[error("application exception in {method} (type {kind}): {message}")]
    Application {
        /// Method that was called.
        method: String,
        /// `TApplicationException` type code.
        kind: i32,
        /// Server-provided message.
        message: String,
    },

    /// The server raised an exception declared by the service.
    #[error("{method} raised server exception: {message}")]
    Server {
        /// Method that was called.
        method: String,
        /// Server-provided message.
        message: String,
    },

    /// A non-void method replied without a value.
    #[error("{0} returned no result")]
    MissingResult(String),
}

impl PushApiError {
    /// The server understood the call and refused it.
    pub fn is_server_rejection(&self) -> bool {
        matches!(self, Self::Application { .. } | Self::Server { .. })
    }

    /// Shorthand for a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

impl From<PushApiError> for AppError {
    fn from(err: PushApiError) -> Self {
        let kind = match &err {
            PushApiError::Io(_)
            | PushApiError::Tls(_)
            | PushApiError::Timeout(_)
            | PushApiError::Desynchronized(_)
            | PushApiError::ConnectionClosed => ErrorKind::Transport,
            PushApiError::Protocol(_) | PushApiError::MissingResult(_) => ErrorKind::Protocol,
            PushApiError::Application { .. } | PushApiError::Server { .. } => {
                ErrorKind::Transmission
            }
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
