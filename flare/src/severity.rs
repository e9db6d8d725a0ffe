//! Host logging levels and their mapping onto [`Severity`].

use flare_core::Severity;

/// Level vocabulary of a host logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    /// Logging switched off for the record
    None,
}

impl HostLevel {
    /// Map onto the internal severity. Total: every level has an image.
    pub const fn severity(self) -> Severity {
        match self {
            HostLevel::Critical => Severity::Critical,
            HostLevel::Error => Severity::Error,
            HostLevel::Warning => Severity::Warning,
            HostLevel::Trace | HostLevel::Debug => Severity::Debug,
            HostLevel::Information | HostLevel::None => Severity::Info,
        }
    }

    /// Parse a level name as host frameworks spell it.
    pub fn parse(name: &str) -> Option<HostLevel> {
        let level = match name.trim().to_ascii_lowercase().as_str() {
            "trace" | "verbose" => HostLevel::Trace,
            "debug" => HostLevel::Debug,
            "information" | "info" => HostLevel::Information,
            "warning" | "warn" => HostLevel::Warning,
            "error" => HostLevel::Error,
            "critical" | "fatal" => HostLevel::Critical,
            "none" | "off" => HostLevel::None,
            _ => return None,
        };
        Some(level)
    }
}

/// Severity for a level given by name; unknown names map to info.
pub fn severity_for_name(name: &str) -> Severity {
    HostLevel::parse(name).map_or(Severity::Info, HostLevel::severity)
}

impl From<HostLevel> for Severity {
    fn from(level: HostLevel) -> Self {
        level.severity()
    }
}

impl From<tracing::Level> for HostLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => HostLevel::Trace,
            tracing::Level::DEBUG => HostLevel::Debug,
            tracing::Level::INFO => HostLevel::Information,
            tracing::Level::WARN => HostLevel::Warning,
            _ => HostLevel::Error,
        }
    }
}
