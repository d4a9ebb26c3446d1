//! Multipart upload spooling configuration.

use serde::{Deserialize, Serialize};

/// Where uploaded attachments are held while their event is transmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Spool directory; created on startup.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,
    /// Remove the spooled file once its event has been processed.
    #[serde(default = "super::default_true")]
    pub remove_after_send: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            spool_dir: default_spool_dir(),
            remove_after_send: true,
        }
    }
}

fn default_spool_dir() -> String {
    "data/uploads".to_string()
}
