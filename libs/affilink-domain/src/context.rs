//! Collaborators shared by every service

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::MarketplaceConfig;
use crate::ids::UserId;
use crate::ports::{
    AuditEntry, AuditSink, Clock, Notification, NotificationKind, Notifier, SystemClock,
    TokenGenerator,
};
use crate::tracking::HashTokenGenerator;

/// Clock, token generator, sinks and configuration handed to each service
#[derive(Clone)]
pub struct ServiceContext {
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<dyn TokenGenerator>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn Notifier>,
    pub config: MarketplaceConfig,
}

impl ServiceContext {
    /// Context with the system clock and the hash token generator
    pub fn new(
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn Notifier>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            tokens: Arc::new(HashTokenGenerator::new(config.tracking_token_length)),
            audit,
            notifier,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn audit(&self, entry: AuditEntry) {
        self.audit.log_action(entry);
    }

    pub(crate) fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        related_id: impl ToString,
    ) {
        self.notifier.notify(Notification {
            user_id,
            title: title.into(),
            body: body.into(),
            kind,
            related_id: Some(related_id.to_string()),
        });
    }
}
