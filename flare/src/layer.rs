//! `tracing` integration.
//!
//! [`FlareLayer`] turns `tracing` events into [`LogRecord`]s for a
//! [`FlareLogger`]. Events emitted by the Flare crates themselves are skipped
//! so that delivery diagnostics never feed back into delivery.

use flare_core::ErrorReport;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};

use crate::logger::{FlareLogger, LogRecord};
use crate::severity::HostLevel;

const INTERNAL_TARGETS: [&str; 4] = ["flare", "flare_core", "flare_net", "flare_runtime"];

/// A `tracing-subscriber` layer reporting events through a [`FlareLogger`].
#[derive(Debug, Clone)]
pub struct FlareLayer {
    logger: FlareLogger,
}

impl FlareLayer {
    pub fn new(logger: FlareLogger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &FlareLogger {
        &self.logger
    }
}

fn is_internal(target: &str) -> bool {
    INTERNAL_TARGETS.iter().any(|internal| {
        target == *internal
            || target
                .strip_prefix(internal)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

impl<S: Subscriber> Layer<S> for FlareLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }
        let level = HostLevel::from(*metadata.level());
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(level);
        record.message = visitor.message;
        record.error = visitor.error;
        record.fields = visitor.fields;
        record
            .fields
            .insert("target".into(), Value::from(metadata.target()));
        self.logger.log(record);
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    error: Option<ErrorReport>,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.error.is_none() {
            self.error = Some(ErrorReport::from_dyn(field.name(), value));
        } else {
            self.put(field, Value::String(value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_targets_are_recognised() {
        assert!(is_internal("flare"));
        assert!(is_internal("flare_net::queue"));
        assert!(!is_internal("flareup"));
        assert!(!is_internal("my_app::flare"));
    }
}
