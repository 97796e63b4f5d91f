//! Ports for the collaborators the core consumes but does not own

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::error::MarketplaceError;
use crate::ids::{AdminId, CampaignId, CategoryId, CompanyId, MarketerId, UserId};

/// A company as seen by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: CompanyId,
    pub user_id: UserId,
    pub is_verified: bool,
}

/// A marketer as seen by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketerProfile {
    pub id: MarketerId,
    pub user_id: UserId,
}

/// Port for existence lookups of companies, categories and marketers
pub trait Directory: Send + Sync {
    fn company(
        &self,
        id: CompanyId,
    ) -> impl Future<Output = Result<Option<CompanyProfile>, MarketplaceError>> + Send;

    fn category_exists(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<bool, MarketplaceError>> + Send;

    fn marketer(
        &self,
        id: MarketerId,
    ) -> impl Future<Output = Result<Option<MarketerProfile>, MarketplaceError>> + Send;
}

/// Source of the current time
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Produces tracking link tokens
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait TokenGenerator: Send + Sync {
    fn generate(&self, marketer_id: MarketerId, campaign_id: CampaignId, at: DateTime<Utc>) -> String;
}

/// Who performed an audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Company(CompanyId),
    Marketer(MarketerId),
    Admin(AdminId),
    /// External event sources and transfer callbacks
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Company(id) => write!(f, "company:{}", id),
            Actor::Marketer(id) => write!(f, "marketer:{}", id),
            Actor::Admin(id) => write!(f, "admin:{}", id),
            Actor::System => f.write_str("system"),
        }
    }
}

/// One audit log record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub actor: Actor,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: String,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
}

impl AuditEntry {
    pub fn new(
        actor: Actor,
        action: &'static str,
        entity_type: &'static str,
        entity_id: impl fmt::Display,
    ) -> Self {
        Self {
            actor,
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            old_values: None,
            new_values: None,
        }
    }

    /// Record a status change as old/new values
    pub fn status_change(mut self, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        self.old_values = Some(format!("status={}", from));
        self.new_values = Some(format!("status={}", to));
        self
    }
}

/// Port for the audit log; called after commit, never fails the operation
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait AuditSink: Send + Sync {
    fn log_action(&self, entry: AuditEntry);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Campaign,
    Application,
    Withdrawal,
    Payment,
}

/// A message for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub related_id: Option<String>,
}

/// Port for notification delivery; called after commit, never fails the operation
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
