//! In-memory implementation of the storage ports
//!
//! A unit of work holds the store-wide lock for its whole lifetime and
//! mutates a private copy of the tables. `commit` swaps the copy in;
//! dropping the unit of work discards it. Every unit of work is therefore
//! serialised, which trivially satisfies the row and marketer locks the
//! ports ask for.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use affilink_domain::application::CampaignApplication;
use affilink_domain::balance::{completed_commissions, WithdrawalTotals};
use affilink_domain::campaign::Campaign;
use affilink_domain::payment::Payment;
use affilink_domain::ports::{
    ApplicationRepository, CampaignRepository, MarketplaceStore, PaymentMethodRepository,
    PaymentRepository, TrackingLinkRepository, UnitOfWork, WithdrawalRepository,
};
use affilink_domain::tracking::{LinkDelta, PerformanceLog, TrackingLink};
use affilink_domain::withdrawal::{PaymentMethod, WithdrawalRequest};
use affilink_domain::{
    ApplicationId, CampaignId, CompanyId, MarketerId, MarketplaceError, PaymentId,
    PaymentMethodId, TrackingLinkId, UserId, WithdrawalId,
};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type StoreResult<T> = Result<T, MarketplaceError>;

#[derive(Debug, Clone, Default)]
struct Tables {
    campaigns: BTreeMap<CampaignId, Campaign>,
    applications: BTreeMap<ApplicationId, CampaignApplication>,
    tracking_links: BTreeMap<TrackingLinkId, TrackingLink>,
    performance_log: Vec<PerformanceLog>,
    payments: BTreeMap<PaymentId, Payment>,
    withdrawals: BTreeMap<WithdrawalId, WithdrawalRequest>,
    payment_methods: BTreeMap<PaymentMethodId, PaymentMethod>,
}

/// Process-local marketplace store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarketplaceStore for InMemoryStore {
    type Tx = InMemoryUnitOfWork;

    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send {
        let tables = self.tables.clone();

        async move {
            let guard = tables.lock_owned().await;
            let working = guard.clone();
            Ok(InMemoryUnitOfWork { guard, working })
        }
    }
}

/// Unit of work over a private copy of the tables
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send {
        let Self { mut guard, working } = self;
        *guard = working;
        trace!("In-memory unit of work committed");
        async move { Ok(()) }
    }
}

fn missing(entity: &'static str, id: impl std::fmt::Display) -> MarketplaceError {
    MarketplaceError::not_found(entity, id)
}

impl CampaignRepository for InMemoryUnitOfWork {
    fn campaign(
        &mut self,
        id: CampaignId,
    ) -> impl Future<Output = StoreResult<Option<Campaign>>> + Send {
        let found = self.working.campaigns.get(&id).cloned();
        async move { Ok(found) }
    }

    fn campaigns_for_company(
        &mut self,
        company_id: CompanyId,
    ) -> impl Future<Output = StoreResult<Vec<Campaign>>> + Send {
        let campaigns = self
            .working
            .campaigns
            .values()
            .filter(|c| c.company_id == company_id && !c.is_deleted())
            .cloned()
            .collect();
        async move { Ok(campaigns) }
    }

    fn insert_campaign(&mut self, campaign: &Campaign) -> impl Future<Output = StoreResult<()>> + Send {
        let result = if self.working.campaigns.contains_key(&campaign.id) {
            Err(MarketplaceError::conflict(format!(
                "campaign {} already exists",
                campaign.id
            )))
        } else {
            self.working.campaigns.insert(campaign.id, campaign.clone());
            Ok(())
        };
        async move { result }
    }

    fn update_campaign(&mut self, campaign: &Campaign) -> impl Future<Output = StoreResult<()>> + Send {
        let result = match self.working.campaigns.get_mut(&campaign.id) {
            Some(row) => {
                *row = campaign.clone();
                Ok(())
            }
            None => Err(missing("Campaign", campaign.id)),
        };
        async move { result }
    }

    fn delete_campaign(&mut self, id: CampaignId) -> impl Future<Output = StoreResult<()>> + Send {
        let result = self
            .working
            .campaigns
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("Campaign", id));
        async move { result }
    }

    fn campaign_has_activity(&mut self, id: CampaignId) -> impl Future<Output = StoreResult<bool>> + Send {
        let active = self
            .working
            .applications
            .values()
            .any(|a| a.campaign_id == id)
            || self
                .working
                .tracking_links
                .values()
                .any(|l| l.campaign_id == id);
        async move { Ok(active) }
    }
}

impl ApplicationRepository for InMemoryUnitOfWork {
    fn application(
        &mut self,
        id: ApplicationId,
    ) -> impl Future<Output = StoreResult<Option<CampaignApplication>>> + Send {
        let found = self.working.applications.get(&id).cloned();
        async move { Ok(found) }
    }

    fn application_for(
        &mut self,
        campaign_id: CampaignId,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Option<CampaignApplication>>> + Send {
        let found = self
            .working
            .applications
            .values()
            .find(|a| a.campaign_id == campaign_id && a.marketer_id == marketer_id)
            .cloned();
        async move { Ok(found) }
    }

    fn applications_for_campaign(
        &mut self,
        campaign_id: CampaignId,
    ) -> impl Future<Output = StoreResult<Vec<CampaignApplication>>> + Send {
        let found = self
            .working
            .applications
            .values()
            .filter(|a| a.campaign_id == campaign_id)
            .cloned()
            .collect();
        async move { Ok(found) }
    }

    fn applications_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<CampaignApplication>>> + Send {
        let found = self
            .working
            .applications
            .values()
            .filter(|a| a.marketer_id == marketer_id)
            .cloned()
            .collect();
        async move { Ok(found) }
    }

    fn insert_application(
        &mut self,
        application: &CampaignApplication,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let duplicate = self.working.applications.values().any(|a| {
            a.campaign_id == application.campaign_id && a.marketer_id == application.marketer_id
        });
        let result = if duplicate {
            Err(MarketplaceError::conflict(format!(
                "marketer {} already applied to campaign {}",
                application.marketer_id, application.campaign_id
            )))
        } else {
            self.working
                .applications
                .insert(application.id, application.clone());
            Ok(())
        };
        async move { result }
    }

    fn update_application(
        &mut self,
        application: &CampaignApplication,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let result = match self.working.applications.get_mut(&application.id) {
            Some(row) => {
                *row = application.clone();
                Ok(())
            }
            None => Err(missing("Application", application.id)),
        };
        async move { result }
    }
}

impl TrackingLinkRepository for InMemoryUnitOfWork {
    fn tracking_link(
        &mut self,
        id: TrackingLinkId,
    ) -> impl Future<Output = StoreResult<Option<TrackingLink>>> + Send {
        let found = self.working.tracking_links.get(&id).cloned();
        async move { Ok(found) }
    }

    fn tracking_link_for(
        &mut self,
        campaign_id: CampaignId,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Option<TrackingLink>>> + Send {
        let found = self
            .working
            .tracking_links
            .values()
            .find(|l| l.campaign_id == campaign_id && l.marketer_id == marketer_id)
            .cloned();
        async move { Ok(found) }
    }

    fn tracking_links_for_campaign(
        &mut self,
        campaign_id: CampaignId,
    ) -> impl Future<Output = StoreResult<Vec<TrackingLink>>> + Send {
        let found = self
            .working
            .tracking_links
            .values()
            .filter(|l| l.campaign_id == campaign_id)
            .cloned()
            .collect();
        async move { Ok(found) }
    }

    fn tracking_links_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<TrackingLink>>> + Send {
        let found = self
            .working
            .tracking_links
            .values()
            .filter(|l| l.marketer_id == marketer_id)
            .cloned()
            .collect();
        async move { Ok(found) }
    }

    fn insert_tracking_link(&mut self, link: &TrackingLink) -> impl Future<Output = StoreResult<()>> + Send {
        let clash = self.working.tracking_links.values().find_map(|existing| {
            if existing.token == link.token {
                Some("token")
            } else if existing.campaign_id == link.campaign_id
                && existing.marketer_id == link.marketer_id
            {
                Some("campaign and marketer")
            } else {
                None
            }
        });
        let result = match clash {
            Some(what) => Err(MarketplaceError::conflict(format!(
                "a tracking link with this {} already exists",
                what
            ))),
            None => {
                self.working.tracking_links.insert(link.id, link.clone());
                Ok(())
            }
        };
        async move { result }
    }

    fn set_tracking_link_active(
        &mut self,
        id: TrackingLinkId,
        active: bool,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let result = match self.working.tracking_links.get_mut(&id) {
            Some(link) => {
                link.is_active = active;
                Ok(())
            }
            None => Err(missing("TrackingLink", id)),
        };
        async move { result }
    }

    fn increment_link_counters(
        &mut self,
        id: TrackingLinkId,
        delta: LinkDelta,
    ) -> impl Future<Output = StoreResult<TrackingLink>> + Send {
        let result = match self.working.tracking_links.get_mut(&id) {
            Some(link) => {
                link.clicks += delta.clicks;
                link.conversions += delta.conversions;
                link.earnings += delta.earnings;
                Ok(link.clone())
            }
            None => Err(missing("TrackingLink", id)),
        };
        async move { result }
    }

    fn append_performance_log(
        &mut self,
        entry: &PerformanceLog,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        self.working.performance_log.push(entry.clone());
        async move { Ok(()) }
    }

    fn performance_log(
        &mut self,
        link_id: TrackingLinkId,
    ) -> impl Future<Output = StoreResult<Vec<PerformanceLog>>> + Send {
        let entries = self
            .working
            .performance_log
            .iter()
            .filter(|e| e.tracking_link_id == link_id)
            .cloned()
            .collect();
        async move { Ok(entries) }
    }
}

impl PaymentRepository for InMemoryUnitOfWork {
    fn payment(&mut self, id: PaymentId) -> impl Future<Output = StoreResult<Option<Payment>>> + Send {
        let found = self.working.payments.get(&id).cloned();
        async move { Ok(found) }
    }

    fn payment_for_withdrawal(
        &mut self,
        withdrawal_id: WithdrawalId,
    ) -> impl Future<Output = StoreResult<Option<Payment>>> + Send {
        let found = self
            .working
            .payments
            .values()
            .find(|p| p.withdrawal_id == Some(withdrawal_id))
            .cloned();
        async move { Ok(found) }
    }

    fn payments_for_user(&mut self, user_id: UserId) -> impl Future<Output = StoreResult<Vec<Payment>>> + Send {
        let found = self
            .working
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        async move { Ok(found) }
    }

    fn insert_payment(&mut self, payment: &Payment) -> impl Future<Output = StoreResult<()>> + Send {
        self.working.payments.insert(payment.id, payment.clone());
        async move { Ok(()) }
    }

    fn update_payment(&mut self, payment: &Payment) -> impl Future<Output = StoreResult<()>> + Send {
        let result = match self.working.payments.get_mut(&payment.id) {
            Some(row) => {
                *row = payment.clone();
                Ok(())
            }
            None => Err(missing("Payment", payment.id)),
        };
        async move { result }
    }

    fn completed_commission_total(&mut self, user_id: UserId) -> impl Future<Output = StoreResult<Decimal>> + Send {
        let total =
            completed_commissions(self.working.payments.values().filter(|p| p.user_id == user_id));
        async move { Ok(total) }
    }
}

impl WithdrawalRepository for InMemoryUnitOfWork {
    fn lock_marketer(&mut self, marketer_id: MarketerId) -> impl Future<Output = StoreResult<()>> + Send {
        // The store-wide guard already serialises this unit of work
        trace!(marketer_id = %marketer_id, "Marketer lock held by unit of work");
        async move { Ok(()) }
    }

    fn withdrawal(
        &mut self,
        id: WithdrawalId,
    ) -> impl Future<Output = StoreResult<Option<WithdrawalRequest>>> + Send {
        let found = self.working.withdrawals.get(&id).cloned();
        async move { Ok(found) }
    }

    fn withdrawals_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<WithdrawalRequest>>> + Send {
        let mut found: Vec<WithdrawalRequest> = self
            .working
            .withdrawals
            .values()
            .filter(|w| w.marketer_id == marketer_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        async move { Ok(found) }
    }

    fn insert_withdrawal(
        &mut self,
        request: &WithdrawalRequest,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        self.working.withdrawals.insert(request.id, request.clone());
        async move { Ok(()) }
    }

    fn update_withdrawal(
        &mut self,
        request: &WithdrawalRequest,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let result = match self.working.withdrawals.get_mut(&request.id) {
            Some(row) => {
                *row = request.clone();
                Ok(())
            }
            None => Err(missing("WithdrawalRequest", request.id)),
        };
        async move { result }
    }

    fn withdrawal_totals(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<WithdrawalTotals>> + Send {
        let totals = WithdrawalTotals::accumulate(
            self.working
                .withdrawals
                .values()
                .filter(|w| w.marketer_id == marketer_id),
        );
        async move { Ok(totals) }
    }
}

impl PaymentMethodRepository for InMemoryUnitOfWork {
    fn payment_method(
        &mut self,
        id: PaymentMethodId,
    ) -> impl Future<Output = StoreResult<Option<PaymentMethod>>> + Send {
        let found = self.working.payment_methods.get(&id).cloned();
        async move { Ok(found) }
    }

    fn payment_methods_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<Vec<PaymentMethod>>> + Send {
        let found = self
            .working
            .payment_methods
            .values()
            .filter(|m| m.marketer_id == marketer_id)
            .cloned()
            .collect();
        async move { Ok(found) }
    }

    fn insert_payment_method(
        &mut self,
        method: &PaymentMethod,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        self.working.payment_methods.insert(method.id, method.clone());
        async move { Ok(()) }
    }

    fn update_payment_method(
        &mut self,
        method: &PaymentMethod,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let result = match self.working.payment_methods.get_mut(&method.id) {
            Some(row) => {
                *row = method.clone();
                Ok(())
            }
            None => Err(missing("PaymentMethod", method.id)),
        };
        async move { result }
    }

    fn clear_default_payment_method(
        &mut self,
        marketer_id: MarketerId,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        self.working
            .payment_methods
            .values_mut()
            .filter(|m| m.marketer_id == marketer_id)
            .for_each(|m| m.is_default = false);
        async move { Ok(()) }
    }

    fn delete_payment_method(&mut self, id: PaymentMethodId) -> impl Future<Output = StoreResult<()>> + Send {
        let result = self
            .working
            .payment_methods
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("PaymentMethod", id));
        async move { result }
    }

    fn payment_method_in_use(&mut self, id: PaymentMethodId) -> impl Future<Output = StoreResult<bool>> + Send {
        let in_use = self
            .working
            .withdrawals
            .values()
            .any(|w| w.payment_method_id == id && w.status.is_in_flight());
        async move { Ok(in_use) }
    }
}
