//! Ports (trait definitions) for external dependencies
//!
//! The domain defines what it needs, adapters provide it:
//!
//! - [`store`]: transactional persistence of every aggregate
//! - [`collaborators`]: directory lookups, audit log, notifications, clock
//!   and tracking token generation

pub mod collaborators;
pub mod store;

pub use collaborators::{
    Actor, AuditEntry, AuditSink, Clock, CompanyProfile, Directory, MarketerProfile, Notification,
    NotificationKind, Notifier, SystemClock, TokenGenerator,
};
pub use store::{
    ApplicationRepository, CampaignRepository, MarketplaceStore, PaymentMethodRepository,
    PaymentRepository, TrackingLinkRepository, UnitOfWork, WithdrawalRepository,
};

#[cfg(any(test, feature = "mocks"))]
pub use collaborators::{MockAuditSink, MockClock, MockNotifier, MockTokenGenerator};
