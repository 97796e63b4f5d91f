//! Storage ports
//!
//! Every state-machine operation runs inside one [`UnitOfWork`] obtained from
//! [`MarketplaceStore::begin`]. The unit of work either commits all of its
//! writes or, when dropped without [`UnitOfWork::commit`], none of them.
//!
//! ## Locking contract
//!
//! - Single-row getters (`campaign`, `application`, `withdrawal`, ...) lock
//!   the row for the rest of the unit of work.
//! - [`WithdrawalRepository::lock_marketer`] serialises every
//!   balance-affecting unit of work of one marketer, so a balance read and
//!   the write that depends on it cannot interleave with another one.
//! - Counter updates ([`TrackingLinkRepository::increment_link_counters`])
//!   are applied by the store atomically, never read-modify-written here.
//! - Unique constraints on (campaign, marketer) for applications and
//!   tracking links, and on the tracking token, are enforced by the store
//!   and reported as `MarketplaceError::Conflict`.
//!
//! ## Static Dispatch
//!
//! Like the rest of the crate's ports these traits use `impl Future` return
//! types, so adapters are monomorphised into the services.

use rust_decimal::Decimal;
use std::future::Future;

use crate::application::CampaignApplication;
use crate::balance::WithdrawalTotals;
use crate::campaign::Campaign;
use crate::error::MarketplaceError;
use crate::ids::{
    ApplicationId, CampaignId, CompanyId, MarketerId, PaymentId, PaymentMethodId, TrackingLinkId,
    UserId, WithdrawalId,
};
use crate::payment::Payment;
use crate::tracking::{LinkDelta, PerformanceLog, TrackingLink};
use crate::withdrawal::{PaymentMethod, WithdrawalRequest};

type StoreResult<T> = Result<T, MarketplaceError>;

/// Port for beginning units of work against the backing store
pub trait MarketplaceStore: Send + Sync {
    type Tx: UnitOfWork;

    /// Open a unit of work
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::StorageFailure` if the store is unavailable
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;
}

/// A transactional scope spanning every repository
pub trait UnitOfWork:
    CampaignRepository
    + ApplicationRepository
    + TrackingLinkRepository
    + PaymentRepository
    + WithdrawalRepository
    + PaymentMethodRepository
    + Send
{
    /// Make every write of this unit of work durable
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;
}

pub trait CampaignRepository: Send {
    /// Load and lock a campaign, tombstoned ones included
    fn campaign(
        &mut self,
        id: CampaignId,
    ) -> impl Future<Output = StoreResult<Option<Campaign>>> + Send;

    /// Campaigns of a company that are not tombstoned
    fn campaigns_for_company(
        &mut self,
        company_id: CompanyId,
    ) -> impl Future<Output = StoreResult<Vec<Campaign>>> + Send;

    fn insert_campaign(
        &mut self,
        campaign: &Campaign,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn update_campaign(
        &mut self,
        campaign: &Campaign,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Physically remove a campaign with no history
    fn delete_campaign(&mut self, id: CampaignId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Whether any application or tracking link references the campaign
    fn campaign_has_activity(
        &mut self,
        id: CampaignId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}

pub trait ApplicationRepository: Send {
    fn application(
        &mut self,
        id: ApplicationId,
    ) -> impl Future<Output = StoreResult<Option<CampaignApplication>>> + Send;

    /// The application of `marketer_id` to `campaign_id`, whatever its status
    fn application_for(
        &mut self,
        campaign_id: CampaignId,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Option<CampaignApplication>>> + Send;

    fn applications_for_campaign(
        &mut self,
        campaign_id: CampaignId,
    ) -> impl Future<Output = StoreResult<Vec<CampaignApplication>>> + Send;

    fn applications_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<CampaignApplication>>> + Send;

    /// # Errors
    ///
    /// `MarketplaceError::Conflict` if the (campaign, marketer) pair already has one
    fn insert_application(
        &mut self,
        application: &CampaignApplication,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn update_application(
        &mut self,
        application: &CampaignApplication,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

pub trait TrackingLinkRepository: Send {
    fn tracking_link(
        &mut self,
        id: TrackingLinkId,
    ) -> impl Future<Output = StoreResult<Option<TrackingLink>>> + Send;

    fn tracking_link_for(
        &mut self,
        campaign_id: CampaignId,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Option<TrackingLink>>> + Send;

    fn tracking_links_for_campaign(
        &mut self,
        campaign_id: CampaignId,
    ) -> impl Future<Output = StoreResult<Vec<TrackingLink>>> + Send;

    fn tracking_links_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<TrackingLink>>> + Send;

    /// # Errors
    ///
    /// `MarketplaceError::Conflict` on a duplicate token or (campaign, marketer) pair
    fn insert_tracking_link(
        &mut self,
        link: &TrackingLink,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn set_tracking_link_active(
        &mut self,
        id: TrackingLinkId,
        active: bool,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Atomically add `delta` to the link's counters and return the new row
    fn increment_link_counters(
        &mut self,
        id: TrackingLinkId,
        delta: LinkDelta,
    ) -> impl Future<Output = StoreResult<TrackingLink>> + Send;

    fn append_performance_log(
        &mut self,
        entry: &PerformanceLog,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Log entries of a link, oldest first
    fn performance_log(
        &mut self,
        link_id: TrackingLinkId,
    ) -> impl Future<Output = StoreResult<Vec<PerformanceLog>>> + Send;
}

pub trait PaymentRepository: Send {
    fn payment(
        &mut self,
        id: PaymentId,
    ) -> impl Future<Output = StoreResult<Option<Payment>>> + Send;

    /// The mirror payment of an approved withdrawal
    fn payment_for_withdrawal(
        &mut self,
        withdrawal_id: WithdrawalId,
    ) -> impl Future<Output = StoreResult<Option<Payment>>> + Send;

    fn payments_for_user(
        &mut self,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Vec<Payment>>> + Send;

    fn insert_payment(&mut self, payment: &Payment)
        -> impl Future<Output = StoreResult<()>> + Send;

    fn update_payment(&mut self, payment: &Payment)
        -> impl Future<Output = StoreResult<()>> + Send;

    /// Σ amount of completed commission payments of `user_id`
    fn completed_commission_total(
        &mut self,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Decimal>> + Send;
}

pub trait WithdrawalRepository: Send {
    /// Serialise balance-affecting work for `marketer_id` until the unit of work ends
    fn lock_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn withdrawal(
        &mut self,
        id: WithdrawalId,
    ) -> impl Future<Output = StoreResult<Option<WithdrawalRequest>>> + Send;

    /// Requests of a marketer, newest first
    fn withdrawals_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<WithdrawalRequest>>> + Send;

    fn insert_withdrawal(
        &mut self,
        request: &WithdrawalRequest,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn update_withdrawal(
        &mut self,
        request: &WithdrawalRequest,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn withdrawal_totals(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<WithdrawalTotals>> + Send;
}

pub trait PaymentMethodRepository: Send {
    fn payment_method(
        &mut self,
        id: PaymentMethodId,
    ) -> impl Future<Output = StoreResult<Option<PaymentMethod>>> + Send;

    fn payment_methods_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<PaymentMethod>>> + Send;

    fn insert_payment_method(
        &mut self,
        method: &PaymentMethod,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn update_payment_method(
        &mut self,
        method: &PaymentMethod,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Unset `is_default` on every method of the marketer
    fn clear_default_payment_method(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_payment_method(
        &mut self,
        id: PaymentMethodId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Whether a pending, approved or processing withdrawal references the method
    fn payment_method_in_use(
        &mut self,
        id: PaymentMethodId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}
