//! # AffiLink Domain Layer
//!
//! Campaign lifecycle and commission settlement for the AffiLink affiliate
//! marketplace. It follows hexagonal architecture principles:
//!
//! - **Entities**: campaigns, applications, tracking links, payments,
//!   withdrawal requests and payment methods, each with a closed
//!   transition table
//! - **Ports**: traits for the transactional store and the collaborators
//!   the core consumes (directory, audit, notifications, clock, tokens)
//! - **Services**: one per state machine, generic over the ports
//!
//! ## Architecture
//!
//! This layer has NO dependencies on infrastructure concerns (SQL, HTTP, ...).
//! Every state-changing operation runs inside one [`ports::UnitOfWork`];
//! balances are derived from persisted history on every read and never
//! stored.
//!
//! ## Example
//!
//! ```rust
//! use affilink_domain::ports::{Directory, MarketplaceStore};
//! use affilink_domain::{MarketerId, Marketplace, PaymentMethodId};
//! use rust_decimal::Decimal;
//!
//! async fn payout<S, D>(marketplace: &Marketplace<S, D>, marketer: MarketerId, method: PaymentMethodId)
//! where
//!     S: MarketplaceStore + Clone,
//!     D: Directory + Clone,
//! {
//!     let balance = marketplace.balances.marketer_balance(marketer).await.unwrap();
//!     if balance.available >= Decimal::TEN {
//!         marketplace
//!             .withdrawals
//!             .create(marketer, balance.available, method)
//!             .await
//!             .unwrap();
//!     }
//! }
//! ```

pub mod application;
pub mod balance;
pub mod campaign;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod marketplace;
pub mod payment;
pub mod ports;
pub mod tracking;
pub mod withdrawal;

// Re-export commonly used types
pub use balance::{BalanceService, MarketerBalance};
pub use config::{ensure_money_scale, MarketplaceConfig, MONEY_SCALE};
pub use context::ServiceContext;
pub use error::{ErrorKind, MarketplaceError, Result};
pub use ids::{
    AdminId, ApplicationId, CampaignId, CategoryId, CompanyId, MarketerId, PaymentId,
    PaymentMethodId, PerformanceLogId, TrackingLinkId, UserId, WithdrawalId,
};
pub use marketplace::Marketplace;
