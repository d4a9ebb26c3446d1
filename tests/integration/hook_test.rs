//! Integration tests for the JSON webhook endpoint.

mod helpers;

use http::StatusCode;
use serde_json::json;

use hookbridge_entity::EventClass;
use hookbridge_service::testing::{FailurePoint, RecordingProcessor};

fn node_created() -> serde_json::Value {
    json!({
        "request_type": "node_created",
        "path": "/Bitrix1/files/help.txt",
        "owner": "Bitrix1",
        "size": 788,
        "datetime": 1666779532
    })
}

#[tokio::test]
async fn test_node_created_is_delivered() {
    let app = helpers::TestApp::new();

    let response = app.hook(node_created()).await;

    assert!(response.is_ack());
    assert_eq!(
        app.processor.call_names(),
        vec![
            "GetVersion",
            "VerifyCredentials",
            "BeginEvent",
            "GetEventDatabaseId",
            "EndEvent(commit)"
        ]
    );

    let events = app.processor.events();
    let event = &events[0];
    assert_eq!(event.class, EventClass::Chat);
    assert_eq!(event.attribute("capture_server_ip"), Some("10.0.0.5"));
    assert_eq!(event.attribute("capture_server_fqdn"), Some("relay.test"));
    let text = &event.messages[0].text;
    assert!(text.contains("Bitrix1"));
    assert!(text.contains("help.txt"));
    assert!(text.contains("788"));
}

#[tokio::test]
async fn test_share_via_link() {
    let app = helpers::TestApp::new();

    let response = app
        .hook(json!({
            "request_type": "node_shared",
            "path": "/alice/files/plan.docx",
            "owner": "alice",
            "share_type": "3",
            "share_with": "bob",
            "permissions": "31"
        }))
        .await;

    assert!(response.is_ack());
    let events = app.processor.events();
    assert_eq!(events.len(), 1);
    let text = &events[0].messages[0].text;
    assert!(text.contains("via link"));
    assert!(text.contains("all"));
}

#[tokio::test]
async fn test_garbage_body_is_acknowledged() {
    let app = helpers::TestApp::new();

    let response = app
        .post("/get_hook", "application/json", b"{not json".to_vec())
        .await;

    assert!(response.is_ack());
    assert!(app.processor.call_names().is_empty());
}

#[tokio::test]
async fn test_unknown_request_type_is_acknowledged() {
    let app = helpers::TestApp::new();

    let response = app
        .hook(json!({ "request_type": "node_deleted", "path": "/a/b", "owner": "a" }))
        .await;

    assert!(response.is_ack());
    assert!(app.processor.call_names().is_empty());
}

#[tokio::test]
async fn test_missing_owner_sends_nothing() {
    let app = helpers::TestApp::new();

    let mut payload = node_created();
    payload.as_object_mut().unwrap().remove("owner");
    let response = app.hook(payload).await;

    assert!(response.is_ack());
    assert!(app.processor.call_names().is_empty());
}

#[tokio::test]
async fn test_json_body_cannot_stream_a_local_file() {
    let app = helpers::TestApp::new();
    let secret = app.spool.path().join("secret.txt");
    std::fs::write(&secret, b"host secret").unwrap();
    let path = secret.to_string_lossy().into_owned();

    for mut payload in [
        json!({ "path": "/eve/files/x.txt", "owner": "eve" }),
        node_created(),
    ] {
        payload["uploaded_file"] = json!(&path);
        let response = app.hook(payload).await;
        assert!(response.is_ack());
    }

    let names = app.processor.call_names();
    assert!(!names.contains(&"BeginStream"));
    assert!(!names.contains(&"SendStreamData"));
    assert!(names.is_empty());
    assert!(app.processor.events().iter().all(|e| e.data.is_empty()));
    assert!(secret.exists());
}

#[tokio::test]
async fn test_old_server_never_opens_an_event() {
    let app = helpers::TestApp::with_processor(RecordingProcessor::new().with_server_version(0));

    let response = app.hook(node_created()).await;

    assert!(response.is_ack());
    assert_eq!(app.processor.call_names(), vec!["GetVersion"]);
}

#[tokio::test]
async fn test_rejected_credentials_never_open_an_event() {
    let app = helpers::TestApp::with_processor(
        RecordingProcessor::new().failing_at(FailurePoint::VerifyCredentials),
    );

    let response = app.hook(node_created()).await;

    assert!(response.is_ack());
    assert_eq!(
        app.processor.call_names(),
        vec!["GetVersion", "VerifyCredentials"]
    );
}

#[tokio::test]
async fn test_failure_after_begin_aborts_event() {
    let app = helpers::TestApp::with_processor(
        RecordingProcessor::new().failing_at(FailurePoint::GetEventDatabaseId),
    );

    let response = app.hook(node_created()).await;

    assert!(response.is_ack());
    assert_eq!(
        app.processor.call_names().last(),
        Some(&"EndEvent(abort)")
    );
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new();

    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
}
