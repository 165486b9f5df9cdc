//! User-visible notifications.
//!
//! At most one notification is live at a time; the viewer replaces the old one
//! and clears it after its time-to-live elapses.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

impl NotificationId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id: NotificationId,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::next(),
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::next(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
