//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Acknowledgement returned by both webhook endpoints, whatever the
/// processing outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookAck {
    /// Always `"OK"`.
    pub result: String,
}

impl HookAck {
    /// The one acknowledgement the webhook sender ever sees.
    pub fn ok() -> Self {
        Self {
            result: "OK".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_shape() {
        let json = serde_json::to_value(HookAck::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "result": "OK" }));
    }
}
