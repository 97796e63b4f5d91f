//! Shared fixtures for the marketplace integration tests

#![allow(dead_code)]

use std::sync::Arc;

use affilink_domain::campaign::{Campaign, CommissionType, NewCampaign};
use affilink_domain::payment::{PaymentStatus, PaymentType};
use affilink_domain::ports::{CompanyProfile, MarketerProfile, TokenGenerator};
use affilink_domain::tracking::{EventType, TrackingLink};
use affilink_domain::withdrawal::{NewPaymentMethod, PaymentMethod, PaymentMethodType};
use affilink_domain::{Marketplace, MarketplaceConfig, ServiceContext};
use affilink_memory::{
    InMemoryDirectory, InMemoryStore, ManualClock, RecordingAuditSink, RecordingNotifier,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

pub type TestMarketplace = Marketplace<InMemoryStore, InMemoryDirectory>;

pub fn start_of_test() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

/// A marketplace over in-memory adapters with a manual clock
pub struct Harness {
    pub marketplace: Arc<TestMarketplace>,
    pub store: InMemoryStore,
    pub directory: InMemoryDirectory,
    pub clock: ManualClock,
    pub audit: RecordingAuditSink,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_tokens(tokens: Arc<dyn TokenGenerator>) -> Self {
        Self::build(Some(tokens))
    }

    fn build(tokens: Option<Arc<dyn TokenGenerator>>) -> Self {
        let store = InMemoryStore::new();
        let directory = InMemoryDirectory::new();
        let clock = ManualClock::new(start_of_test());
        let audit = RecordingAuditSink::default();
        let notifier = RecordingNotifier::default();

        let mut ctx = ServiceContext::new(
            Arc::new(audit.clone()),
            Arc::new(notifier.clone()),
            MarketplaceConfig::default(),
        )
        .with_clock(Arc::new(clock.clone()));
        if let Some(tokens) = tokens {
            ctx = ctx.with_tokens(tokens);
        }

        Self {
            marketplace: Arc::new(Marketplace::new(store.clone(), directory.clone(), ctx)),
            store,
            directory,
            clock,
            audit,
            notifier,
        }
    }

    pub fn new_campaign(&self, category_id: affilink_domain::CategoryId) -> NewCampaign {
        let now = self.clock_now();
        NewCampaign {
            title: "Spring sneakers".to_string(),
            description: "Promote the spring collection".to_string(),
            category_id,
            commission_type: CommissionType::Percentage,
            commission_value: Decimal::new(125, 1),
            budget: Some(Decimal::new(5_000, 0)),
            start_date: now,
            end_date: now + Duration::days(30),
            promotional_materials: None,
        }
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        use affilink_domain::ports::Clock;
        self.clock.now()
    }

    /// A verified company with a pending campaign
    pub async fn pending_campaign(&self) -> (CompanyProfile, Campaign) {
        let company = self.directory.add_company(true).await;
        let category = self.directory.add_category().await;
        let campaign = self
            .marketplace
            .campaigns
            .create(company.id, self.new_campaign(category))
            .await
            .unwrap();
        (company, campaign)
    }

    /// A verified company with an approved campaign
    pub async fn active_campaign(&self) -> (CompanyProfile, Campaign) {
        let (company, campaign) = self.pending_campaign().await;
        let campaign = self
            .marketplace
            .campaigns
            .approve(campaign.id, affilink_domain::AdminId::new())
            .await
            .unwrap();
        (company, campaign)
    }

    /// A marketer whose application to `campaign` has been accepted
    pub async fn promoter(
        &self,
        company: &CompanyProfile,
        campaign: &Campaign,
    ) -> (MarketerProfile, TrackingLink) {
        let marketer = self.directory.add_marketer().await;
        let application = self
            .marketplace
            .applications
            .apply(campaign.id, marketer.id)
            .await
            .unwrap();
        let approved = self
            .marketplace
            .applications
            .approve(application.id, company.id, None)
            .await
            .unwrap();
        (marketer, approved.tracking_link)
    }

    /// Record a conversion of `amount` on `link` and settle its commission
    pub async fn earn(&self, marketer: &MarketerProfile, link: &TrackingLink, amount: Decimal) {
        self.marketplace
            .tracking
            .record_event(link.id, EventType::Conversion, amount)
            .await
            .unwrap();

        let pending = self
            .marketplace
            .payments
            .list_for_user(marketer.user_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| {
                p.payment_type == PaymentType::Commission && p.status == PaymentStatus::Pending
            })
            .collect::<Vec<_>>();
        for payment in pending {
            self.marketplace
                .payments
                .complete(payment.id, Some(format!("commission-{}", payment.id)))
                .await
                .unwrap();
        }
    }

    /// A marketer with `gross` completed commission earnings and a payout method
    pub async fn funded_marketer(&self, gross: Decimal) -> (MarketerProfile, PaymentMethod) {
        let (company, campaign) = self.active_campaign().await;
        let (marketer, link) = self.promoter(&company, &campaign).await;
        if gross > Decimal::ZERO {
            self.earn(&marketer, &link, gross).await;
        }
        let method = self.payment_method(&marketer).await;
        (marketer, method)
    }

    pub async fn payment_method(&self, marketer: &MarketerProfile) -> PaymentMethod {
        self.marketplace
            .payment_methods
            .add(
                marketer.id,
                NewPaymentMethod {
                    method_type: PaymentMethodType::BankTransfer,
                    account_details: "DE89 3704 0044 0532 0130 00".to_string(),
                    account_holder_name: "Ada Lovelace".to_string(),
                    make_default: false,
                },
            )
            .await
            .unwrap()
    }
}
