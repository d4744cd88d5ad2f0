use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;

use smstodo_core::signature::{self, SignatureMethod};
use smstodo_core::sms::SmsSender;
use smstodo_core::store::{ListStore, MemoryStore, TodoItem};
use smstodo_core::{Result as CoreResult, TodoError};
use smstodo_server::state::AppState;

const SECRET: &str = "integration-secret";
const SENDER: &str = "15551234567";
const SERVICE: &str = "15559876543";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Records every sent message; optionally fails each send.
#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: bool,
}

impl RecordingSms {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl SmsSender for RecordingSms {
    fn send(&self, from: &str, to: &str, text: &str) -> CoreResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((from.to_string(), to.to_string(), text.to_string()));
        if self.fail {
            return Err(TodoError::SmsSend("gateway unavailable".to_string()));
        }
        Ok(())
    }
}

/// Store whose every operation fails, for the store-outage path.
struct BrokenStore;

impl ListStore for BrokenStore {
    fn list_items(&self, _owner: &str) -> CoreResult<Vec<TodoItem>> {
        Err(TodoError::Store("connection refused".to_string()))
    }
    fn find_item(&self, _owner: &str, _text: &str) -> CoreResult<Option<TodoItem>> {
        Err(TodoError::Store("connection refused".to_string()))
    }
    fn create_item(&self, _owner: &str, _text: &str) -> CoreResult<TodoItem> {
        Err(TodoError::Store("connection refused".to_string()))
    }
    fn delete_item(&self, _owner: &str, _text: &str) -> CoreResult<bool> {
        Err(TodoError::Store("connection refused".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    store: Arc<MemoryStore>,
    sms: Arc<RecordingSms>,
    app: axum::Router,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let sms = Arc::new(RecordingSms::default());
    let state = AppState::new(
        store.clone(),
        sms.clone(),
        "+15559876543",
        SECRET,
        SignatureMethod::Md5Hash,
    );
    Harness {
        store,
        sms,
        app: smstodo_server::build_router(state),
    }
}

fn app_with(store: Arc<dyn ListStore>, sms: Arc<dyn SmsSender>) -> axum::Router {
    let state = AppState::new(
        store,
        sms,
        "+15559876543",
        SECRET,
        SignatureMethod::Md5Hash,
    );
    smstodo_server::build_router(state)
}

/// Build a signed form body the way the gateway would.
fn signed_form(text: &str) -> String {
    let mut params = vec![
        ("msisdn".to_string(), SENDER.to_string()),
        ("to".to_string(), SERVICE.to_string()),
        ("text".to_string(), text.to_string()),
        ("messageId".to_string(), "msg-0001".to_string()),
        ("timestamp".to_string(), Utc::now().timestamp().to_string()),
    ];
    let sig = signature::sign(&params, SECRET, SignatureMethod::Md5Hash);
    params.push(("sig".to_string(), sig));
    serde_urlencoded::to_string(&params).unwrap()
}

/// POST a form body to the webhook endpoint, returning (status, JSON body).
async fn post_webhook(app: axum::Router, body: String) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/webhooks/inbound-sms")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(body))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_from_empty_list_confirms_and_persists() {
    let h = harness();

    let (status, _) = post_webhook(h.app.clone(), signed_form("add Buy milk")).await;
    assert_eq!(status, StatusCode::OK);

    let items = h.store.list_items("+15551234567").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text, "Buy milk");

    let sent = h.sms.sent();
    assert_eq!(sent.len(), 1);
    let (from, to, text) = &sent[0];
    assert_eq!(from, "+15559876543");
    assert_eq!(to, "+15551234567");
    assert_eq!(text, "Added: Buy milk");
}

#[tokio::test]
async fn done_with_different_casing_removes_then_list_is_empty() {
    let h = harness();

    post_webhook(h.app.clone(), signed_form("add Buy milk")).await;
    let (status, _) = post_webhook(h.app.clone(), signed_form("done BUY MILK")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.store.list_items("+15551234567").unwrap().is_empty());

    post_webhook(h.app.clone(), signed_form("list")).await;
    let sent = h.sms.sent();
    assert_eq!(sent[1].2, "Done: Buy milk");
    assert_eq!(sent[2].2, "No open TODOs!");
}

#[tokio::test]
async fn done_on_missing_item_reports_not_found_without_mutation() {
    let h = harness();

    let (status, _) = post_webhook(h.app.clone(), signed_form("done Buy eggs")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.store.list_items("+15551234567").unwrap().is_empty());
    assert_eq!(h.sms.sent()[0].2, "Not found: Buy eggs");
}

#[tokio::test]
async fn invalid_signature_is_401_with_no_side_effects() {
    let h = harness();

    let mut body = signed_form("add Buy milk");
    // Flip the message text after signing.
    body = body.replace("add+Buy+milk", "add+Buy+eggs");

    let (status, json) = post_webhook(h.app.clone(), body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().contains("signature"));
    assert!(h.store.list_items("+15551234567").unwrap().is_empty());
    assert!(h.sms.sent().is_empty());
}

#[tokio::test]
async fn missing_signature_fields_is_401() {
    let h = harness();
    let body = format!("msisdn={SENDER}&to={SERVICE}&text=list");
    let (status, _) = post_webhook(h.app.clone(), body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.sms.sent().is_empty());
}

#[tokio::test]
async fn stale_timestamp_is_401() {
    let h = harness();

    let stale = (Utc::now() - chrono::Duration::hours(2)).timestamp();
    let mut params = vec![
        ("msisdn".to_string(), SENDER.to_string()),
        ("to".to_string(), SERVICE.to_string()),
        ("text".to_string(), "list".to_string()),
        ("timestamp".to_string(), stale.to_string()),
    ];
    let sig = signature::sign(&params, SECRET, SignatureMethod::Md5Hash);
    params.push(("sig".to_string(), sig));
    let body = serde_urlencoded::to_string(&params).unwrap();

    let (status, _) = post_webhook(h.app.clone(), body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Payload validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_sender_field_is_400() {
    let h = harness();
    let body = format!("to={SERVICE}&text=list");
    let (status, json) = post_webhook(h.app.clone(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("msisdn"));
    assert!(h.sms.sent().is_empty());
}

#[tokio::test]
async fn missing_text_field_is_400() {
    let h = harness();
    let body = format!("msisdn={SENDER}&to={SERVICE}");
    let (status, _) = post_webhook(h.app.clone(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unparseable_sender_number_is_400() {
    let h = harness();
    let body = format!("msisdn=banana&to={SERVICE}&text=list");
    let (status, _) = post_webhook(h.app.clone(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.sms.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Reply and failure policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_command_gets_polite_reply() {
    let h = harness();
    let (status, _) = post_webhook(h.app.clone(), signed_form("make me a sandwich")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.sms.sent()[0].2.contains("help"));
}

#[tokio::test]
async fn help_lists_commands() {
    let h = harness();
    post_webhook(h.app.clone(), signed_form("help")).await;
    let reply = &h.sms.sent()[0].2;
    for keyword in ["add", "done", "list", "help"] {
        assert!(reply.contains(keyword));
    }
}

#[tokio::test]
async fn reply_send_failure_does_not_change_http_status() {
    let sms = Arc::new(RecordingSms::failing());
    let app = app_with(Arc::new(MemoryStore::new()), sms.clone());

    let (status, _) = post_webhook(app, signed_form("add Buy milk")).await;
    assert_eq!(status, StatusCode::OK);
    // The send was attempted even though it failed.
    assert_eq!(sms.sent().len(), 1);
}

#[tokio::test]
async fn store_failure_with_deliverable_reply_is_200() {
    let sms = Arc::new(RecordingSms::default());
    let app = app_with(Arc::new(BrokenStore), sms.clone());

    let (status, _) = post_webhook(app, signed_form("add Buy milk")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sms.sent()[0].2.contains("internal error"));
}

#[tokio::test]
async fn store_failure_with_undeliverable_reply_is_500() {
    let sms = Arc::new(RecordingSms::failing());
    let app = app_with(Arc::new(BrokenStore), sms.clone());

    let (status, _) = post_webhook(app, signed_form("add Buy milk")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn concurrent_adds_of_same_text_leave_one_item() {
    let h = harness();

    let first = post_webhook(h.app.clone(), signed_form("add Buy milk"));
    let second = post_webhook(h.app.clone(), signed_form("add buy milk"));
    let (a, b) = tokio::join!(first, second);
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(h.store.list_items("+15551234567").unwrap().len(), 1);
}

#[tokio::test]
async fn healthz_is_ok() {
    let h = harness();
    let req = axum::http::Request::builder()
        .uri("/healthz")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
