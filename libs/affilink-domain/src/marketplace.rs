//! One handle over every service, sharing a store, directory and context

use crate::application::ApplicationService;
use crate::balance::BalanceService;
use crate::campaign::CampaignService;
use crate::context::ServiceContext;
use crate::payment::PaymentService;
use crate::ports::{Directory, MarketplaceStore};
use crate::tracking::TrackingService;
use crate::withdrawal::{PaymentMethodService, WithdrawalService};

/// All marketplace services wired to the same adapters
pub struct Marketplace<S, D> {
    pub campaigns: CampaignService<S, D>,
    pub applications: ApplicationService<S, D>,
    pub tracking: TrackingService<S, D>,
    pub balances: BalanceService<S, D>,
    pub payments: PaymentService<S>,
    pub withdrawals: WithdrawalService<S, D>,
    pub payment_methods: PaymentMethodService<S, D>,
}

impl<S, D> Marketplace<S, D>
where
    S: MarketplaceStore + Clone,
    D: Directory + Clone,
{
    pub fn new(store: S, directory: D, ctx: ServiceContext) -> Self {
        Self {
            campaigns: CampaignService::new(store.clone(), directory.clone(), ctx.clone()),
            applications: ApplicationService::new(store.clone(), directory.clone(), ctx.clone()),
            tracking: TrackingService::new(store.clone(), directory.clone(), ctx.clone()),
            balances: BalanceService::new(store.clone(), directory.clone()),
            payments: PaymentService::new(store.clone(), ctx.clone()),
            withdrawals: WithdrawalService::new(store.clone(), directory.clone(), ctx.clone()),
            payment_methods: PaymentMethodService::new(store, directory, ctx),
        }
    }
}
