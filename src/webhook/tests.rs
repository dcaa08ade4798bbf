//! Tests for the webhook receiver's HTTP surface.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::{AppState, Dispatcher, EVENT_HEADER, RoutedEvent, WEBHOOK_PATH, router};
use crate::orchestrator::Trigger;

#[derive(Default)]
struct RecordingDispatcher {
    events: Mutex<Vec<RoutedEvent>>,
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, event: RoutedEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

fn app(dispatcher: &Arc<RecordingDispatcher>) -> axum::Router {
    let shared: Arc<dyn Dispatcher> = Arc::clone(dispatcher) as Arc<dyn Dispatcher>;
    router(AppState::new(shared, "Archaeologist Dig"))
}

fn delivery(event: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json");
    if let Some(name) = event {
        builder = builder.header(EVENT_HEADER, name);
    }
    builder.body(Body::from(body)).expect("request should build")
}

fn check_run_body(name: &str) -> String {
    json!({
        "action": "completed",
        "repository": { "full_name": "electron/electron" },
        "check_run": {
            "id": 12,
            "name": name,
            "head_sha": "abc123",
            "html_url": "https://github.com/electron/electron/runs/12"
        }
    })
    .to_string()
}

#[tokio::test]
async fn healthz_reports_ok() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .expect("request should build");

    let response = app(&dispatcher)
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn matching_check_run_is_dispatched() {
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let response = app(&dispatcher)
        .oneshot(delivery(
            Some("check_run"),
            check_run_body("Archaeologist Dig"),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let events = dispatcher.events.lock().expect("events lock");
    let [routed] = events.as_slice() else {
        panic!("expected one dispatched event, got {}", events.len());
    };
    assert_eq!(routed.repository, "electron/electron");
    assert!(matches!(routed.trigger, Trigger::CheckCompleted(_)));
}

#[tokio::test]
async fn unrelated_check_run_is_acknowledged_without_dispatch() {
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let response = app(&dispatcher)
        .oneshot(delivery(Some("check_run"), check_run_body("lint")))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(dispatcher.events.lock().expect("events lock").is_empty());
}

#[tokio::test]
async fn missing_event_header_is_rejected() {
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let response = app(&dispatcher)
        .oneshot(delivery(None, check_run_body("Archaeologist Dig")))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(dispatcher.events.lock().expect("events lock").is_empty());
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let response = app(&dispatcher)
        .oneshot(delivery(Some("pull_request"), "not json".to_owned()))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ping_is_acknowledged() {
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let response = app(&dispatcher)
        .oneshot(delivery(Some("ping"), json!({ "zen": "Design for failure." }).to_string()))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
