//! Transient user notices

use casemap_edit::NoticeLevel;
use serde::Serialize;
use tracing::{error, info, warn};

/// How a notice is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Operation confirmed
    Success,
    /// Informational
    Info,
    /// Refused request
    Warning,
    /// Backend failure
    Error,
}

impl From<NoticeLevel> for Severity {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Info => Self::Info,
            NoticeLevel::Warning => Self::Warning,
        }
    }
}

/// A short message shown once to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Sink for user-visible notices
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Show a notice
    fn notify(&self, notice: &Notice);
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.severity {
            Severity::Success | Severity::Info => info!(message = %notice.message, "notice"),
            Severity::Warning => warn!(message = %notice.message, "notice"),
            Severity::Error => error!(message = %notice.message, "notice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_levels_map_to_severity() {
        assert_eq!(Severity::from(NoticeLevel::Info), Severity::Info);
        assert_eq!(Severity::from(NoticeLevel::Warning), Severity::Warning);
    }

    #[test]
    fn tracing_notifier_accepts_every_severity() {
        let notifier = TracingNotifier;
        for severity in [
            Severity::Success,
            Severity::Info,
            Severity::Warning,
            Severity::Error,
        ] {
            notifier.notify(&Notice::new(severity, "hello"));
        }
    }

    #[test]
    fn notices_serialize_flat() {
        let value = serde_json::to_value(Notice::error("Save failed")).unwrap();
        assert_eq!(value["severity"], "error");
        assert_eq!(value["message"], "Save failed");
    }
}
