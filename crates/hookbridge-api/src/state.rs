//! Application state shared across all handlers and middleware.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hookbridge_core::config::AppConfig;
use hookbridge_service::RelayService;

/// Shared application state, cloned into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Webhook processing pipeline.
    pub relay: Arc<RelayService>,
    /// When the server started, for the health probe.
    pub started_at: Instant,
}

impl AppState {
    /// Create state around a ready pipeline.
    pub fn new(config: Arc<AppConfig>, relay: Arc<RelayService>) -> Self {
        Self {
            config,
            relay,
            started_at: Instant::now(),
        }
    }

    /// Where multipart uploads are spooled.
    pub fn spool_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.upload.spool_dir)
    }

    /// How long a handler waits for processing before acknowledging anyway.
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.processing_timeout_seconds)
    }
}
