//! Notifier port - user-facing notices (toasts, banners).

use serde::Serialize;

/// How prominently a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Info,
    Destructive,
}

/// A short message for the person using the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: NoticeSeverity,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: NoticeSeverity::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: NoticeSeverity::Destructive,
        }
    }
}

/// Surfaces notices to the presentation layer.
///
/// Fire-and-forget: implementations must not block and cannot fail.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
