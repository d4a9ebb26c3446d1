//! Capture (PushAPI) server connection configuration.

use serde::{Deserialize, Serialize};

/// Connection, credential, and capture-attribute settings for the
/// traffic capture server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture server host name or address.
    pub host: String,
    /// Capture server port.
    pub port: u16,
    /// Company name half of the PushAPI credentials.
    pub company_name: String,
    /// Token half of the PushAPI credentials.
    #[serde(skip_serializing)]
    pub token: String,
    /// Protocol version this client requires from the server.
    /// `None` uses the version compiled into the client.
    #[serde(default)]
    pub client_version: Option<i32>,
    /// TCP connect plus TLS handshake timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Timeout for a single RPC round trip in seconds.
    #[serde(default = "default_io_timeout")]
    pub io_timeout_seconds: u64,
    /// Largest frame accepted from or sent to the server.
    #[serde(default = "default_max_frame")]
    pub max_frame_bytes: usize,
    /// Value of the `capture_server_ip` event attribute.
    #[serde(default = "default_server_ip")]
    pub server_ip: String,
    /// Value of the `capture_server_fqdn` event attribute.
    #[serde(default = "default_server_fqdn")]
    pub server_fqdn: String,
    /// TLS settings.
    #[serde(default)]
    pub tls: CaptureTlsConfig,
}

/// TLS client settings for the capture connection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CaptureTlsConfig {
    /// PEM bundle of trusted roots. When absent the server certificate
    /// is accepted without validation.
    #[serde(default)]
    pub ca_file: Option<String>,
    /// Name presented via SNI and checked against the certificate.
    /// Defaults to `host`.
    #[serde(default)]
    pub server_name: Option<String>,
}

impl CaptureConfig {
    /// `host:port` of the capture server.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_io_timeout() -> u64 {
    60
}

fn default_max_frame() -> usize {
    256 * 1024 * 1024
}

fn default_server_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_server_fqdn() -> String {
    "hookbridge.localdomain".to_string()
}
