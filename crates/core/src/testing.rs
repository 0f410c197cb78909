//! Test helpers shared by the unit tests

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Panics from inside the logging call for events carrying `field = value`.
///
/// Lets tests make ordinary per-cell processing fail without special hooks
/// in the code under test.
struct PanicOnField {
    field: &'static str,
    value: &'static str,
}

struct Matches<'a> {
    field: &'a str,
    value: &'a str,
    hit: bool,
}

impl Visit for Matches<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == self.field && value == self.value {
            self.hit = true;
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == self.field && format!("{:?}", value) == self.value {
            self.hit = true;
        }
    }
}

impl<S: Subscriber> Layer<S> for PanicOnField {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut matches = Matches {
            field: self.field,
            value: self.value,
            hit: false,
        };
        event.record(&mut matches);
        if matches.hit {
            panic!("log sink failed");
        }
    }
}

/// Run `f` with a thread-local subscriber that panics on events where
/// `field` renders as `value`. `"message"` matches the formatted message.
pub(crate) fn with_panicking_log<T>(
    field: &'static str,
    value: &'static str,
    f: impl FnOnce() -> T,
) -> T {
    let subscriber = tracing_subscriber::registry().with(PanicOnField { field, value });
    tracing::subscriber::with_default(subscriber, f)
}
