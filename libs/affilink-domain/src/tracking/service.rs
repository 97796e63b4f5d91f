//! Tracking service - the attribution ledger
//!
//! Every event appends one performance log entry. Clicks and conversions
//! also bump the link counters through an atomic store increment, and a
//! paid conversion accrues a pending commission payment for the marketer.

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use super::entity::{EventType, LinkDelta, PerformanceLog, TrackingLink};
use super::stats::{earnings_by_campaign, CampaignEarnings, CampaignPerformance, LinkStats};
use crate::campaign::load_live_campaign;
use crate::context::ServiceContext;
use crate::config::ensure_money_scale;
use crate::error::{MarketplaceError, Result};
use crate::ids::{CampaignId, MarketerId, TrackingLinkId};
use crate::payment::Payment;
use crate::ports::{
    Actor, AuditEntry, Directory, MarketplaceStore, PaymentRepository, TrackingLinkRepository,
    UnitOfWork,
};

async fn load_link<T: TrackingLinkRepository>(
    tx: &mut T,
    id: TrackingLinkId,
) -> Result<TrackingLink> {
    tx.tracking_link(id)
        .await?
        .ok_or_else(|| MarketplaceError::not_found("TrackingLink", id))
}

/// Service for tracking links and their performance log
pub struct TrackingService<S, D> {
    store: S,
    directory: D,
    ctx: ServiceContext,
}

impl<S, D> TrackingService<S, D>
where
    S: MarketplaceStore,
    D: Directory,
{
    pub fn new(store: S, directory: D, ctx: ServiceContext) -> Self {
        Self {
            store,
            directory,
            ctx,
        }
    }

    /// Record one event against an active link
    ///
    /// # Arguments
    ///
    /// * `id` - The tracking link the event is attributed to
    /// * `event` - What happened
    /// * `amount_earned` - Commission for a conversion; zero for other events
    ///
    /// # Returns
    ///
    /// The link with its counters after the increment
    ///
    /// # Errors
    ///
    /// - `Validation` for a negative amount, an amount on a non-conversion or
    ///   an amount finer than cents
    /// - `NotFound` if the link does not exist
    /// - `InvalidOperation` if the link has been deactivated
    #[instrument(skip(self), fields(tracking_link_id = %id, event = %event))]
    pub async fn record_event(
        &self,
        id: TrackingLinkId,
        event: EventType,
        amount_earned: Decimal,
    ) -> Result<TrackingLink> {
        if amount_earned < Decimal::ZERO {
            return Err(MarketplaceError::validation(
                "amount earned must not be negative",
            ));
        }
        if event != EventType::Conversion && !amount_earned.is_zero() {
            return Err(MarketplaceError::validation(format!(
                "only conversions carry an amount, got {} for a {}",
                amount_earned, event
            )));
        }
        ensure_money_scale("amount earned", amount_earned)?;

        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let link = load_link(&mut tx, id).await?;
        if !link.is_active {
            return Err(MarketplaceError::invalid_operation(format!(
                "tracking link {} is inactive",
                id
            )));
        }

        let delta = LinkDelta::for_event(event, amount_earned);
        let link = if delta.is_empty() {
            link
        } else {
            tx.increment_link_counters(id, delta).await?
        };

        tx.append_performance_log(&PerformanceLog::new(id, event, amount_earned, now))
            .await?;

        if event == EventType::Conversion && amount_earned > Decimal::ZERO {
            let marketer = self
                .directory
                .marketer(link.marketer_id)
                .await?
                .ok_or_else(|| MarketplaceError::not_found("Marketer", link.marketer_id))?;
            let commission =
                Payment::commission(marketer.user_id, link.campaign_id, amount_earned, now);
            tx.insert_payment(&commission).await?;
            debug!(payment_id = %commission.id, amount = %amount_earned, "Commission accrued");
        }

        tx.commit().await?;

        debug!(
            clicks = link.clicks,
            conversions = link.conversions,
            earnings = %link.earnings,
            "Event recorded"
        );

        Ok(link)
    }

    /// Stop a link from accepting events; its history is kept
    ///
    /// # Errors
    ///
    /// - `NotFound` if the link does not exist
    /// - `Forbidden` if `marketer_id` does not own the link
    /// - `InvalidOperation` if the link is already inactive
    #[instrument(skip(self), fields(tracking_link_id = %id, marketer_id = %marketer_id))]
    pub async fn deactivate(
        &self,
        id: TrackingLinkId,
        marketer_id: MarketerId,
    ) -> Result<TrackingLink> {
        let mut tx = self.store.begin().await?;

        let mut link = load_link(&mut tx, id).await?;
        if link.marketer_id != marketer_id {
            return Err(MarketplaceError::forbidden(
                "only the link owner can deactivate it",
            ));
        }
        if !link.is_active {
            return Err(MarketplaceError::invalid_operation(format!(
                "tracking link {} is already inactive",
                id
            )));
        }

        tx.set_tracking_link_active(id, false).await?;
        tx.commit().await?;
        link.is_active = false;

        info!("Tracking link deactivated");
        self.ctx.audit(AuditEntry::new(
            Actor::Marketer(marketer_id),
            "tracking_link.deactivated",
            "TrackingLink",
            id,
        ));

        Ok(link)
    }

    pub async fn get(&self, id: TrackingLinkId) -> Result<TrackingLink> {
        let mut tx = self.store.begin().await?;
        load_link(&mut tx, id).await
    }

    pub async fn link_stats(&self, id: TrackingLinkId) -> Result<LinkStats> {
        let link = self.get(id).await?;
        Ok(LinkStats::from(&link))
    }

    /// Totals across every link of a campaign
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown and archived campaigns
    pub async fn campaign_performance(&self, campaign_id: CampaignId) -> Result<CampaignPerformance> {
        let mut tx = self.store.begin().await?;
        load_live_campaign(&mut tx, campaign_id).await?;
        let links = tx.tracking_links_for_campaign(campaign_id).await?;
        Ok(CampaignPerformance::from_links(campaign_id, &links))
    }

    pub async fn earnings_by_campaign(&self, marketer_id: MarketerId) -> Result<Vec<CampaignEarnings>> {
        let links = self.links_for_marketer(marketer_id).await?;
        Ok(earnings_by_campaign(&links))
    }

    /// Logged events of a link, oldest first
    pub async fn performance_log(&self, id: TrackingLinkId) -> Result<Vec<PerformanceLog>> {
        let mut tx = self.store.begin().await?;
        load_link(&mut tx, id).await?;
        tx.performance_log(id).await
    }

    pub async fn links_for_marketer(&self, marketer_id: MarketerId) -> Result<Vec<TrackingLink>> {
        let mut tx = self.store.begin().await?;
        tx.tracking_links_for_marketer(marketer_id).await
    }
}
