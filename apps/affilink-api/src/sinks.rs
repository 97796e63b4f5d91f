//! Audit and notification sinks that emit structured log events
//!
//! Persistence of the audit trail and delivery of notifications belong to
//! other services; this host hands both off through the `audit` and
//! `notification` tracing targets.

use affilink_domain::ports::{AuditEntry, AuditSink, Notification, Notifier};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn log_action(&self, entry: AuditEntry) {
        info!(
            target: "audit",
            actor = %entry.actor,
            action = entry.action,
            entity_type = entry.entity_type,
            entity_id = %entry.entity_id,
            old_values = entry.old_values.as_deref(),
            new_values = entry.new_values.as_deref(),
            "Audit entry"
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        info!(
            target: "notification",
            user_id = %notification.user_id,
            kind = ?notification.kind,
            related_id = notification.related_id.as_deref(),
            title = %notification.title,
            "{}",
            notification.body
        );
    }
}
