//! Webhook-to-event mapping configuration.

use serde::{Deserialize, Serialize};

/// Settings that shape the events produced from webhook payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Label prefixed to every event title, e.g. `OwnCloud: file uploaded`.
    #[serde(default = "default_source_label")]
    pub source_label: String,
    /// PushAPI service name set on every event.
    #[serde(default = "default_service")]
    pub service: String,
    /// Origin that public share link paths are expanded against.
    #[serde(default)]
    pub public_origin: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            source_label: default_source_label(),
            service: default_service(),
            public_origin: String::new(),
        }
    }
}

fn default_source_label() -> String {
    "OwnCloud".to_string()
}

fn default_service() -> String {
    "im_skype".to_string()
}
