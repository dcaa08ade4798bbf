//! HTTP receiver for GitHub webhook deliveries.
//!
//! `POST /api/github/webhooks` decodes the delivery named by the
//! `X-GitHub-Event` header, hands any resulting trigger to a [`Dispatcher`],
//! and answers `202 Accepted` without waiting for the run. `GET /healthz`
//! answers `200 OK`.

mod dispatch;
mod events;

pub use dispatch::{CircleCiSettings, GitHubDispatcher};
pub use events::{RoutedEvent, route_event};

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Header carrying the webhook event name.
pub const EVENT_HEADER: &str = "x-github-event";
/// Path deliveries are posted to.
pub const WEBHOOK_PATH: &str = "/api/github/webhooks";

/// Receives routed triggers and runs them in the background.
pub trait Dispatcher: Send + Sync {
    /// Starts processing `event`; must not block on the run.
    fn dispatch(&self, event: RoutedEvent);
}

/// Shared state of the webhook receiver.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<dyn Dispatcher>,
    check_name: Arc<str>,
}

impl AppState {
    /// Creates receiver state filtering completed check runs by
    /// `check_name`.
    #[must_use]
    pub fn new(dispatcher: Arc<dyn Dispatcher>, check_name: &str) -> Self {
        Self {
            dispatcher,
            check_name: Arc::from(check_name),
        }
    }
}

/// Builds the receiver's router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(receive))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let Some(event) = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("webhook delivery without event header");
        return StatusCode::BAD_REQUEST;
    };

    match route_event(event, &body, &state.check_name) {
        Ok(Some(routed)) => {
            info!(
                event,
                repository = %routed.repository,
                head_sha = routed.trigger.head_sha(),
                "dispatching trigger"
            );
            state.dispatcher.dispatch(routed);
            StatusCode::ACCEPTED
        }
        Ok(None) => {
            debug!(event, "ignoring delivery");
            StatusCode::ACCEPTED
        }
        Err(route_error) => {
            warn!(event, error = %route_error, "rejecting webhook delivery");
            StatusCode::BAD_REQUEST
        }
    }
}

#[cfg(test)]
mod tests;
