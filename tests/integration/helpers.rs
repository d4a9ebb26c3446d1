//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hookbridge_api::{AppState, build_app};
use hookbridge_core::config::AppConfig;
use hookbridge_service::RelayService;
use hookbridge_service::testing::RecordingProcessor;

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "hookbridge-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// In-memory capture server
    pub processor: RecordingProcessor,
    /// Application config
    pub config: AppConfig,
    /// Upload spool, removed with the app
    pub spool: TempDir,
}

impl TestApp {
    /// Create a new test application with a well-behaved capture server
    pub fn new() -> Self {
        Self::with_processor(RecordingProcessor::new())
    }

    /// Create a new test application around `processor`
    pub fn with_processor(processor: RecordingProcessor) -> Self {
        let spool = TempDir::new().expect("Failed to create spool dir");
        let config = AppConfig::from_toml_str(&format!(
            r#"
            [server]
            processing_timeout_seconds = 10

            [capture]
            host = "capture.test"
            port = 9090
            company_name = "acme"
            token = "secret"
            server_ip = "10.0.0.5"
            server_fqdn = "relay.test"

            [upload]
            spool_dir = "{}"
            "#,
            spool.path().display()
        ))
        .expect("Failed to parse test config");

        let relay = RelayService::new(&config, Arc::new(processor.clone()))
            .expect("Failed to build relay");
        let router = build_app(AppState::new(Arc::new(config.clone()), Arc::new(relay)));

        Self {
            router,
            processor,
            config,
            spool,
        }
    }

    /// Files currently in the upload spool
    pub fn spooled_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.spool.path())
            .expect("Failed to read spool dir")
            .map(|entry| entry.expect("Failed to read spool entry").path())
            .collect()
    }

    /// POST a raw body to `path`
    pub async fn post(&self, path: &str, content_type: &str, body: Vec<u8>) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// POST a JSON webhook to `/get_hook`
    pub async fn hook(&self, body: Value) -> TestResponse {
        self.post("/get_hook", "application/json", body.to_string().into_bytes())
            .await
    }

    /// POST a multipart form to `/upload_hook`
    pub async fn upload(&self, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> TestResponse {
        self.post(
            "/upload_hook",
            &format!("multipart/form-data; boundary={BOUNDARY}"),
            multipart_body(fields, file),
        )
        .await
    }

    /// GET `path`
    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Encode text fields and an optional `file` part as multipart/form-data
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Test response wrapper
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// Whether this is the webhook acknowledgement
    pub fn is_ack(&self) -> bool {
        self.status == StatusCode::OK && self.body == serde_json::json!({ "result": "OK" })
    }
}
