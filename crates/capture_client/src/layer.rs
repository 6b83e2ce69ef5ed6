use std::{collections::BTreeMap, fmt, sync::Arc};

use capture_core::{Breadcrumb, Level};
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;

use crate::CaptureClient;

const OWN_CRATES: [&str; 3] = ["capture_core", "capture_client", "capture_node"];

/// `tracing` layer that records application events as breadcrumbs on a [`CaptureClient`].
///
/// The breadcrumb category is the event target and the message is the `message` field; other
/// fields land in `data`. Events emitted by the capture crates themselves are skipped so that
/// forwarding diagnostics never turn into breadcrumbs.
pub struct BreadcrumbLayer {
    client: Arc<CaptureClient>,
    min_level: tracing::Level,
}

impl BreadcrumbLayer {
    /// Records events at `INFO` and more severe.
    pub fn new(client: Arc<CaptureClient>) -> Self {
        Self {
            client,
            min_level: tracing::Level::INFO,
        }
    }

    pub fn min_level(mut self, level: tracing::Level) -> Self {
        self.min_level = level;
        self
    }
}

impl fmt::Debug for BreadcrumbLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreadcrumbLayer")
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

impl<S> tracing_subscriber::Layer<S> for BreadcrumbLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        // tracing orders levels by verbosity: TRACE is the greatest.
        if *meta.level() > self.min_level || is_own_target(meta.target()) {
            return;
        }

        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        self.client.record_breadcrumb(Breadcrumb {
            ty: Some("default".to_string()),
            category: Some(meta.target().to_string()),
            message: visitor.message,
            level: map_level(meta.level()),
            data: visitor.data,
            ..Breadcrumb::default()
        });
    }
}

fn is_own_target(target: &str) -> bool {
    OWN_CRATES.iter().any(|name| {
        target
            .strip_prefix(name)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warning,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    data: BTreeMap<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.data.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_targets_match_whole_crate_paths() {
        assert!(is_own_target("capture_client"));
        assert!(is_own_target("capture_node::forward"));
        assert!(!is_own_target("capture_metrics"));
        assert!(!is_own_target("capture_clientele::api"));
        assert!(!is_own_target("app::capture_node"));
    }
}
