//! Payload packaging
//!
//! Turns a queued [`Event`] into the `data` payload and wraps it in the
//! envelope handed to the transport.

use flare_core::schema::{self, DATA};
use flare_core::{ClientConfig, Event, ExtendablePayload, SchemaViolation, Severity};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Notifier name stamped on every data payload
pub const NOTIFIER_NAME: &str = "flare-rs";

/// Top-level object sent to the collector
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Project access token
    pub access_token: String,
    /// The event itself
    pub data: ExtendablePayload,
}

impl Envelope {
    pub fn new(access_token: impl Into<String>, data: ExtendablePayload) -> Self {
        Self {
            access_token: access_token.into(),
            data,
        }
    }

    /// Serialize the envelope to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Build the `data` payload for one queued event.
///
/// Prebuilt data keeps every field it already has; only missing defaults are
/// filled in. `custom` is merged into the data's `custom` object, caller keys
/// winning over keys already present there.
pub fn package(
    event: Event,
    severity: Severity,
    custom: Option<Map<String, Value>>,
    config: &ClientConfig,
    timestamp_secs: u64,
) -> Result<ExtendablePayload, SchemaViolation> {
    let body = event.to_body()?;
    let mut data = match event {
        Event::Data(data) if data.kind() == &DATA => data,
        Event::Data(other) => {
            // Not a data payload: carry it as the body of one.
            let kind = other.kind().name;
            ExtendablePayload::new(&DATA)?.with("body", json!({ kind: other }))
        }
        _ => ExtendablePayload::new(&DATA)?,
    };

    if let Some(body) = body {
        data.insert("body", body);
    }
    fill_default(&mut data, "level", || json!(severity.as_str()));
    fill_default(&mut data, "environment", || json!(config.environment));
    fill_default(&mut data, "timestamp", || json!(timestamp_secs));
    fill_default(&mut data, "platform", || json!(std::env::consts::OS));
    fill_default(&mut data, "language", || json!("rust"));
    fill_default(&mut data, "notifier", || {
        json!({ "name": NOTIFIER_NAME, "version": env!("CARGO_PKG_VERSION") })
    });
    if let Some(version) = &config.code_version {
        fill_default(&mut data, "code_version", || json!(version));
    }

    if let Some(custom) = custom.filter(|c| !c.is_empty()) {
        let mut merged = match data.remove("custom") {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        merged.extend(custom);
        data.insert("custom", Value::Object(merged));
    }

    debug_assert!(data.kind().descends_from(&schema::EXTENDABLE));
    Ok(data)
}

fn fill_default<F>(data: &mut ExtendablePayload, key: &str, value: F)
where
    F: FnOnce() -> Value,
{
    if data.schema_field(key).is_none() {
        data.insert(key, value());
    }
}
