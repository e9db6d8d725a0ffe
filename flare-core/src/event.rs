//! What callers report.

use serde_json::{json, Value};

use crate::payload::ExtendablePayload;
use crate::registry::SchemaViolation;
use crate::schema;

/// One error in a cause chain, flattened for the wire.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorReport {
    /// Short type name of the error
    pub class: String,
    /// `Display` output of the error
    pub message: String,
    /// Underlying causes, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorReport {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Capture `err` and walk its `source()` chain.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let mut report = Self::new(short_type_name::<E>(), err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            report.causes.push(cause.to_string());
            source = cause.source();
        }
        report
    }

    /// Capture a type-erased error; the class is taken from `class`.
    pub fn from_dyn(class: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut report = Self::new(class, err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            report.causes.push(cause.to_string());
            source = cause.source();
        }
        report
    }

    fn to_trace(&self, description: Option<&str>) -> Value {
        let mut exception = json!({
            "class": self.class,
            "message": self.message,
        });
        if let Some(description) = description {
            exception["description"] = Value::String(description.to_string());
        }
        let mut trace = json!({ "exception": exception, "frames": [] });
        if !self.causes.is_empty() {
            trace["causes"] = json!(self.causes);
        }
        trace
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A reportable event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A fully built `data` payload, sent as is
    Data(ExtendablePayload),
    /// A plain message
    Message(String),
    /// An error, optionally described by a message
    Error {
        report: ErrorReport,
        description: Option<String>,
    },
}

impl Event {
    pub fn message(text: impl Into<String>) -> Self {
        Event::Message(text.into())
    }

    pub fn error(report: ErrorReport) -> Self {
        Event::Error {
            report,
            description: None,
        }
    }

    /// Whether there is nothing worth reporting.
    pub fn is_empty(&self) -> bool {
        match self {
            Event::Data(data) => data.is_empty(),
            Event::Message(text) => text.trim().is_empty(),
            Event::Error { .. } => false,
        }
    }

    /// The `body` value for a data payload; `None` for prebuilt data.
    pub fn to_body(&self) -> Result<Option<Value>, SchemaViolation> {
        match self {
            Event::Data(_) => Ok(None),
            Event::Message(text) => {
                let message = ExtendablePayload::new(&schema::MESSAGE)?.with("body", text.as_str());
                Ok(Some(json!({ "message": message })))
            }
            Event::Error {
                report,
                description,
            } => Ok(Some(json!({
                "trace": report.to_trace(description.as_deref())
            }))),
        }
    }
}

impl From<ExtendablePayload> for Event {
    fn from(data: ExtendablePayload) -> Self {
        Event::Data(data)
    }
}

impl From<String> for Event {
    fn from(text: String) -> Self {
        Event::Message(text)
    }
}

impl From<&str> for Event {
    fn from(text: &str) -> Self {
        Event::Message(text.to_string())
    }
}

impl From<ErrorReport> for Event {
    fn from(report: ErrorReport) -> Self {
        Event::error(report)
    }
}
