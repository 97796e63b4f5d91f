//! Clock and sinks that keep what they see, for tests and local runs

use std::sync::{Arc, Mutex, MutexGuard};

use affilink_domain::ports::{AuditEntry, AuditSink, Clock, Notification, Notifier};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *lock(&self.now) = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// Audit sink that records every entry
#[derive(Debug, Clone, Default)]
pub struct RecordingAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl RecordingAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        lock(&self.entries).clone()
    }

    /// Recorded actions, in order
    pub fn actions(&self) -> Vec<&'static str> {
        lock(&self.entries).iter().map(|e| e.action).collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn log_action(&self, entry: AuditEntry) {
        debug!(action = entry.action, entity_id = %entry.entity_id, "Audit entry recorded");
        lock(&self.entries).push(entry);
    }
}

/// Notifier that records every notification
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        debug!(user_id = %notification.user_id, title = %notification.title, "Notification recorded");
        lock(&self.sent).push(notification);
    }
}
