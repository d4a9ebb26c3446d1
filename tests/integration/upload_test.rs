//! Integration tests for the multipart upload endpoint.

mod helpers;

use bytes::Bytes;

use hookbridge_entity::EventClass;
use hookbridge_service::testing::{FailurePoint, RecordedCall, RecordingProcessor};

const FIELDS: &[(&str, &str)] = &[("path", "/alice/files/plan.docx"), ("owner", "alice")];

#[tokio::test]
async fn test_upload_streams_file() {
    let app = helpers::TestApp::new();

    let response = app.upload(FIELDS, Some(("plan.docx", &b"quarterly plan"[..]))).await;

    assert!(response.is_ack());
    assert_eq!(
        app.processor.call_names(),
        vec![
            "GetVersion",
            "VerifyCredentials",
            "BeginEvent",
            "BeginStream",
            "SendStreamData",
            "EndStream",
            "GetEventDatabaseId",
            "EndEvent(commit)"
        ]
    );

    let sent: Vec<Bytes> = app
        .processor
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RecordedCall::SendStreamData { data, .. } => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(sent, vec![Bytes::from_static(b"quarterly plan")]);

    let event = &app.processor.events()[0];
    assert_eq!(event.class, EventClass::FileExchange);
    assert!(event.messages.is_empty());
    assert_eq!(event.data[0].filename(), Some("plan.docx"));

    assert!(app.spooled_files().is_empty());
}

#[tokio::test]
async fn test_stream_failure_aborts_and_cleans_spool() {
    let app = helpers::TestApp::with_processor(
        RecordingProcessor::new().failing_at(FailurePoint::SendStreamData),
    );

    let response = app.upload(FIELDS, Some(("plan.docx", &b"data"[..]))).await;

    assert!(response.is_ack());
    let names = app.processor.call_names();
    assert_eq!(
        &names[names.len() - 2..],
        &["EndStream", "EndEvent(abort)"]
    );
    assert!(app.spooled_files().is_empty());
}

#[tokio::test]
async fn test_missing_owner_sends_nothing() {
    let app = helpers::TestApp::new();

    let response = app
        .upload(&[("path", "/alice/files/plan.docx")], Some(("plan.docx", &b"data"[..])))
        .await;

    assert!(response.is_ack());
    assert!(app.processor.call_names().is_empty());
    assert!(app.spooled_files().is_empty());
}

#[tokio::test]
async fn test_form_without_file_is_acknowledged() {
    let app = helpers::TestApp::new();

    let response = app.upload(FIELDS, None).await;

    assert!(response.is_ack());
    assert!(app.processor.call_names().is_empty());
}

#[tokio::test]
async fn test_non_multipart_body_is_acknowledged() {
    let app = helpers::TestApp::new();

    let response = app
        .post("/upload_hook", "application/json", b"{}".to_vec())
        .await;

    assert!(response.is_ack());
    assert!(app.processor.call_names().is_empty());
}
