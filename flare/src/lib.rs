//! # Flare
//!
//! **Telemetry and error reporting with schema-safe payloads and bounded blocking delivery.**
//!
//! Events are built as extendable payloads whose reserved keys can never be
//! shadowed by custom data, counted against per-scope ceilings, and handed to
//! an asynchronous delivery queue. Callers that need to know an event went out
//! block on a [`BlockingDeliveryBridge`] for at most a configured timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use flare::prelude::*;
//!
//! fn main() -> flare::Result<()> {
//!     let config = ClientConfig::builder()
//!         .access_token("POST_SERVER_ITEM_TOKEN")
//!         .environment("staging")
//!         .min_severity(Severity::Warning)
//!         .build();
//!     let client = Flare::builder().config(config).build(NdjsonTransport::stdout())?;
//!
//!     client
//!         .as_blocking(Duration::from_secs(2))
//!         .error("disk quota exceeded")?;
//!     client.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `layer` (default): [`FlareLayer`](layer::FlareLayer), a `tracing-subscriber` layer
//!
//! ## Crate Structure
//!
//! - [`flare_core`]: Severity, configuration, payload schema and scopes
//! - [`flare_net`]: Delivery queue, signals and transports
//! - [`flare_runtime`]: Async runtime glue (Tokio)

#![forbid(unsafe_code)]

// Re-export sub-crates
pub use flare_core as core;
pub use flare_net as net;
pub use flare_runtime as runtime;

pub use async_trait::async_trait;

// Re-export commonly used items at the top level
pub use flare_core::{
    schema, ClientConfig, ErrorReport, Event, ExtendablePayload, HttpAttributes, Scope,
    SchemaViolation, Severity,
};
pub use flare_net::{
    traits::{DeliveryQueue, Transport},
    DeliveryOutcome, MockTransport, NdjsonTransport,
};

pub mod bridge;
pub mod client;
#[cfg(feature = "layer")]
pub mod layer;
pub mod lifecycle;
pub mod logger;
pub mod severity;

pub use bridge::{BlockingDeliveryBridge, DeliveryError};
pub use client::{Flare, FlareBuilder};
pub use lifecycle::LifecycleOwner;
pub use logger::{EventId, FlareLogger, LogDisposition, LogRecord, CEILING_WARNING};
pub use severity::HostLevel;

/// Prelude module for convenient imports
///
/// ```rust
/// use flare::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::net::prelude::*;

    pub use crate::{
        BlockingDeliveryBridge, DeliveryError, Flare, FlareLogger, HostLevel, LogRecord,
        MockTransport, NdjsonTransport,
    };
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload schema table is inconsistent
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
    /// The client configuration could not be read
    #[error(transparent)]
    Config(#[from] flare_core::Error),
    /// No runtime could be started for the delivery worker
    #[error("failed to start delivery runtime: {0}")]
    Runtime(#[from] std::io::Error),
    /// A blocking delivery did not conclude
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
