//! Client configuration.

use core::time::Duration;

use crate::severity::Severity;

/// Default wait for a blocking delivery.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration shared by the delivery queue and everything layered on it.
///
/// The queue hands out read-only snapshots of this; reconfiguring swaps the
/// whole value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Project token sent in every envelope
    pub access_token: String,
    /// Deployment environment name (e.g. `production`)
    pub environment: String,
    /// Master switch; a disabled client drops everything at the door
    pub enabled: bool,
    /// Events below this severity are filtered before any other work
    pub min_severity: Option<Severity>,
    /// Maximum events accepted per scope; `0` means unlimited
    pub max_events_per_scope: u32,
    /// Wait applied when a blocking caller does not pass its own
    #[serde(with = "duration_ms")]
    pub default_timeout: Duration,
    /// Optional code version stamped on outgoing data payloads
    pub code_version: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            environment: "production".to_string(),
            enabled: true,
            min_severity: None,
            max_events_per_scope: 0,
            default_timeout: DEFAULT_TIMEOUT,
            code_version: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Start a builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether an event at `severity` survives the configured threshold.
    pub fn admits_severity(&self, severity: Severity) -> bool {
        self.enabled && severity.passes(self.min_severity)
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = token.into();
        self
    }

    /// Set the environment name
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = environment.into();
        self
    }

    /// Enable or disable reporting
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Set the minimum severity that gets reported
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.config.min_severity = Some(severity);
        self
    }

    /// Set the per-scope event ceiling (`0` = unlimited)
    pub fn max_events_per_scope(mut self, max: u32) -> Self {
        self.config.max_events_per_scope = max;
        self
    }

    /// Set the default blocking timeout
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    /// Set the code version
    pub fn code_version(mut self, version: impl Into<String>) -> Self {
        self.config.code_version = Some(version.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

mod duration_ms {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = ClientConfig::builder()
            .access_token("tok")
            .environment("staging")
            .min_severity(Severity::Warning)
            .max_events_per_scope(10)
            .default_timeout(Duration::from_millis(250))
            .build();

        assert_eq!(config.access_token, "tok");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.min_severity, Some(Severity::Warning));
        assert_eq!(config.max_events_per_scope, 10);
        assert_eq!(config.default_timeout, Duration::from_millis(250));
    }

    #[test]
    fn json_fills_defaults() {
        let config =
            ClientConfig::from_json(r#"{"access_token":"abc","min_severity":"error","default_timeout":1500}"#)
                .unwrap();
        assert_eq!(config.access_token, "abc");
        assert_eq!(config.environment, "production");
        assert_eq!(config.min_severity, Some(Severity::Error));
        assert_eq!(config.max_events_per_scope, 0);
        assert_eq!(config.default_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ClientConfig::from_json(r#"{"min_severity":"loud"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn disabled_client_admits_nothing() {
        let config = ClientConfig::builder().enabled(false).build();
        assert!(!config.admits_severity(Severity::Critical));
    }
}
