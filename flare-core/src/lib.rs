//! # Flare Core
//!
//! Core types of the Flare telemetry client.
//!
//! This crate is runtime-agnostic and provides:
//! - Internal [`Severity`] levels and the [`ClientConfig`] consumed by delivery
//! - A declarative payload schema ([`schema`]) with a single-rooted hierarchy
//! - The reserved-key [`registry`] guarding schema fields from custom data
//! - [`ExtendablePayload`], which routes reserved custom keys into schema fields
//! - Per-scope event accounting ([`scope`])
//!
//! ## Feature Flags
//!
//! - `telemetry`: Emit `tracing` diagnostics from registry builds

pub mod config;
pub mod event;
pub mod payload;
pub mod registry;
pub mod schema;
pub mod scope;
pub mod severity;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use event::{ErrorReport, Event};
pub use payload::ExtendablePayload;
pub use registry::{FieldAccessor, ReservationRegistry, ReservedKeySet, SchemaViolation};
pub use schema::{FieldDecl, PayloadKind};
pub use scope::{Admission, HttpAttributes, RequestContext, Scope, ScopeGuard, ScopeState};
pub use severity::Severity;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::event::*;
    pub use crate::payload::*;
    pub use crate::registry::*;
    pub use crate::scope::*;
    pub use crate::severity::*;
}

/// Result type for core operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for core operations
///
/// Schema problems surface as [`SchemaViolation`] directly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration document could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
