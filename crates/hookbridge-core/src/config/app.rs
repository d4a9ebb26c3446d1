//! HTTP listener configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body (multipart uploads included).
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
    /// Upper bound for processing one webhook, mapping through EndEvent.
    #[serde(default = "default_processing_timeout")]
    pub processing_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload(),
            processing_timeout_seconds: default_processing_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8989
}

fn default_max_upload() -> usize {
    64 * 1024 * 1024
}

fn default_processing_timeout() -> u64 {
    120
}
