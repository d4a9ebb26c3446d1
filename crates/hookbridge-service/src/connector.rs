//! Opening processor connections.

use std::sync::Arc;

use async_trait::async_trait;

use hookbridge_core::config::capture::CaptureConfig;
use hookbridge_core::result::AppResult;
use hookbridge_pushapi::EventProcessor;
use hookbridge_pushapi::transport::{self, TlsClientConfig};

/// Opens one processor connection per transmission.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connect to the capture server.
    async fn connect(&self) -> AppResult<Box<dyn EventProcessor>>;

    /// Where connections go, for logs.
    fn describe(&self) -> String;
}

/// Connects to the capture server over TLS.
#[derive(Debug, Clone)]
pub struct CaptureConnector {
    config: CaptureConfig,
    tls: Arc<TlsClientConfig>,
}

impl CaptureConnector {
    /// Build the TLS configuration once; every connection reuses it.
    pub fn new(config: CaptureConfig) -> AppResult<Self> {
        let tls = transport::tls_config(config.tls.ca_file.as_deref())?;
        Ok(Self { config, tls })
    }
}

#[async_trait]
impl Connector for CaptureConnector {
    async fn connect(&self) -> AppResult<Box<dyn EventProcessor>> {
        let client = transport::connect(&self.config, self.tls.clone()).await?;
        Ok(Box::new(client))
    }

    fn describe(&self) -> String {
        self.config.address()
    }
}
