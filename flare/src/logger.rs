//! Host logger adapter.
//!
//! [`FlareLogger`] receives records from a host logging framework, filters
//! them, accounts them against the ambient [`Scope`] and delivers them
//! through a [`BlockingDeliveryBridge`]. A delivery timeout is logged and
//! swallowed; logging never fails the caller.

use std::time::{SystemTime, UNIX_EPOCH};

use flare_core::schema::{DATA, HTTP_REQUEST};
use flare_core::{
    Admission, ErrorReport, Event, ExtendablePayload, HttpAttributes, RequestContext, Scope,
    ScopeGuard, Severity,
};
use serde_json::{json, Map, Value};

use crate::bridge::{BlockingDeliveryBridge, DeliveryError};
use crate::severity::HostLevel;

/// Message reported once per scope when its event ceiling is reached.
pub const CEILING_WARNING: &str =
    "Maximum events per scope reached; further events in this scope are not reported";

/// Numeric id and optional name of a host log event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventId {
    pub id: i64,
    pub name: Option<String>,
}

impl EventId {
    pub fn new(id: i64) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => write!(f, "{} ({})", self.id, name),
            _ => write!(f, "{}", self.id),
        }
    }
}

/// One record from the host framework.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: HostLevel,
    pub event_id: EventId,
    pub message: Option<String>,
    pub error: Option<ErrorReport>,
    /// Structured fields, reported as custom data
    pub fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(level: HostLevel) -> Self {
        Self {
            level,
            event_id: EventId::default(),
            message: None,
            error: None,
            fields: Map::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(mut self, error: ErrorReport) -> Self {
        self.error = Some(error);
        self
    }

    pub fn event_id(mut self, event_id: EventId) -> Self {
        self.event_id = event_id;
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// What became of a logged record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDisposition {
    /// Below the configured threshold, or logging is off
    Disabled,
    /// Neither a message nor an error
    Empty,
    /// The scope already reached its ceiling
    OverCeiling,
    /// Handed to the pipeline and concluded in time
    Delivered,
    /// Handed over but not concluded in time
    TimedOut,
    /// The queue refused the record
    Refused,
}

/// Adapter between a host logging framework and the delivery pipeline.
#[derive(Debug, Clone)]
pub struct FlareLogger {
    name: String,
    bridge: BlockingDeliveryBridge,
}

impl FlareLogger {
    pub fn new(name: impl Into<String>, bridge: BlockingDeliveryBridge) -> Self {
        Self {
            name: name.into(),
            bridge,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bridge(&self) -> &BlockingDeliveryBridge {
        &self.bridge
    }

    /// Whether records at `level` would be reported.
    pub fn is_enabled(&self, level: HostLevel) -> bool {
        level != HostLevel::None && self.bridge.queue().config().admits_severity(level.severity())
    }

    /// Open a scope on this thread. Nested scopes count their own events and
    /// share the enclosing request context.
    pub fn begin_scope(&self, name: impl Into<String>) -> ScopeGuard {
        let scope = match Scope::current() {
            Some(parent) => parent.child(name),
            None => Scope::root(name, RequestContext::new(unix_secs())),
        };
        scope.enter()
    }

    /// Open a top-level scope for an HTTP request being served.
    pub fn begin_request_scope(&self, name: impl Into<String>, http: HttpAttributes) -> ScopeGuard {
        let context = RequestContext::new(unix_secs()).with_http(http);
        Scope::root(name, context).enter()
    }

    /// Report one record, counted against the thread's ambient scope if any.
    pub fn log(&self, record: LogRecord) -> LogDisposition {
        self.log_in(Scope::current().as_ref(), record)
    }

    /// Report one record, counted against an explicitly passed scope.
    pub fn log_in(&self, scope: Option<&Scope>, record: LogRecord) -> LogDisposition {
        if !self.is_enabled(record.level) {
            return LogDisposition::Disabled;
        }

        let LogRecord {
            level,
            event_id,
            message,
            error,
            fields,
        } = record;
        let message = message.filter(|m| !m.trim().is_empty());

        let mut custom = fields;
        custom.insert("LogEventID".into(), json!(event_id.to_string()));
        let event = match error {
            Some(report) => {
                if let Some(message) = &message {
                    custom.insert("LogMessage".into(), json!(message));
                }
                Event::Error {
                    report,
                    description: message,
                }
            }
            None => Event::Message(message.unwrap_or_default()),
        };
        if event.is_empty() {
            return LogDisposition::Empty;
        }

        let config = self.bridge.queue().config();
        let mut ceiling_reached_in = None;
        if let Some(scope) = scope {
            match scope.admit(config.max_events_per_scope) {
                Admission::Accepted => {}
                Admission::AcceptedWithCeilingWarning => ceiling_reached_in = Some(scope),
                Admission::Rejected => return LogDisposition::OverCeiling,
            }
        }

        let severity = level.severity();
        let data = match self.data_payload(event, scope, custom) {
            Ok(data) => data,
            Err(violation) => {
                tracing::error!(error = %violation, "payload schema is inconsistent");
                return LogDisposition::Refused;
            }
        };

        let disposition = match self.bridge.deliver(data, severity, None) {
            Ok(()) => LogDisposition::Delivered,
            Err(DeliveryError::Timeout { timeout }) => {
                tracing::warn!(
                    logger = %self.name,
                    %severity,
                    timeout_ms = timeout.as_millis() as u64,
                    "event delivery timed out"
                );
                LogDisposition::TimedOut
            }
            Err(DeliveryError::Enqueue(err)) => {
                tracing::warn!(logger = %self.name, error = %err, "event was not queued");
                LogDisposition::Refused
            }
        };

        if let Some(scope) = ceiling_reached_in {
            self.report_ceiling(scope, config.max_events_per_scope);
        }
        disposition
    }

    /// Tell the collector that the rest of `scope` goes unreported.
    fn report_ceiling(&self, scope: &Scope, max_events: u32) {
        tracing::warn!(
            logger = %self.name,
            scope = scope.name(),
            max_events,
            "scope reached its event ceiling; further events in it are dropped"
        );

        let mut custom = Map::new();
        custom.insert("scope".into(), json!(scope.name()));
        custom.insert("max_events".into(), json!(max_events));
        if let Err(err) =
            self.bridge
                .log_at(Severity::Warning, Event::message(CEILING_WARNING), Some(custom))
        {
            tracing::debug!(logger = %self.name, error = %err, "ceiling warning not delivered");
        }
    }

    fn data_payload(
        &self,
        event: Event,
        scope: Option<&Scope>,
        custom: Map<String, Value>,
    ) -> Result<ExtendablePayload, flare_core::SchemaViolation> {
        let mut data = ExtendablePayload::new(&DATA)?;
        if let Some(body) = event.to_body()? {
            data.insert("body", body);
        }
        data.insert("custom", Value::Object(custom));
        if let Some(scope) = scope {
            data.insert("request", request_payload(&scope.context())?.into_value());
        }
        Ok(data)
    }
}

fn request_payload(context: &RequestContext) -> Result<ExtendablePayload, flare_core::SchemaViolation> {
    let mut request = ExtendablePayload::new(&HTTP_REQUEST)?.with("timestamp", context.timestamp);
    if let Some(http) = &context.http {
        let values = [
            ("request_id", http.request_id.clone().map(Value::from)),
            ("method", http.method.clone().map(Value::from)),
            ("url", http.url.clone().map(Value::from)),
            ("status_code", http.status_code.map(Value::from)),
            ("scheme", http.scheme.clone().map(Value::from)),
            ("protocol", http.protocol.clone().map(Value::from)),
        ];
        for (key, value) in values
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
        {
            request.insert(key, value);
        }
    }
    Ok(request)
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
