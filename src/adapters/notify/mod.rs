//! Notifier adapters.
//!
//! - `TracingNotifier` - writes notices to the log, for headless runs
//! - `RecordingNotifier` - keeps notices in memory for assertions

use std::sync::{Mutex, PoisonError};

use crate::ports::{Notice, NoticeSeverity, Notifier};

/// Emits each notice as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            NoticeSeverity::Info => {
                tracing::info!(title = %notice.title, "{}", notice.description)
            }
            NoticeSeverity::Destructive => {
                tracing::warn!(title = %notice.title, "{}", notice.description)
            }
        }
    }
}

/// Collects notices in call order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notice::info("a", "first"));
        notifier.notify(Notice::destructive("b", "second"));

        let notices = notifier.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].title, "a");
        assert_eq!(notices[1].severity, NoticeSeverity::Destructive);
    }

    #[test]
    fn tracing_notifier_accepts_any_severity() {
        TracingNotifier.notify(Notice::info("t", "d"));
        TracingNotifier.notify(Notice::destructive("t", "d"));
    }
}
