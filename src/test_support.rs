//! Helpers shared by unit tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Fields of one captured tracing event, rendered with `Debug`.
pub type CapturedFields = BTreeMap<String, String>;

/// Tracing layer that records every event's fields for later assertions.
#[derive(Clone, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<CapturedFields>>>);

impl CapturedEvents {
    /// Installs a capturing subscriber as the thread default.
    ///
    /// Only effective on current-thread runtimes, which is what
    /// `#[tokio::test]` uses.
    pub fn install() -> (Self, DefaultGuard) {
        let events = Self::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (events, guard)
    }

    /// Events whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<CapturedFields> {
        self.0
            .lock()
            .expect("captured events mutex should be available")
            .iter()
            .filter(|fields| fields.get("message").is_some_and(|value| value == message))
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        self.0
            .lock()
            .expect("captured events mutex should be available")
            .push(collector.0);
    }
}

#[derive(Default)]
struct FieldCollector(CapturedFields);

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }
}
