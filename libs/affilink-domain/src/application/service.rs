//! Application service
//!
//! Approving an application and issuing the marketer's tracking link happen
//! in the same unit of work: either both are visible or neither is.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::entity::{ApplicationTransition, CampaignApplication};
use crate::campaign::{load_live_campaign, CampaignStatus};
use crate::context::ServiceContext;
use crate::error::{MarketplaceError, Result};
use crate::ids::{ApplicationId, CampaignId, CompanyId, MarketerId};
use crate::ports::{
    Actor, ApplicationRepository, AuditEntry, Directory, MarketplaceStore,
    NotificationKind, TrackingLinkRepository, UnitOfWork,
};
use crate::tracking::TrackingLink;

/// Result of approving an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedApplication {
    pub application: CampaignApplication,
    /// The marketer's link for the campaign
    pub tracking_link: TrackingLink,
    /// `false` when the pair already had a link and it was reused
    pub link_created: bool,
}

async fn load_application<T: ApplicationRepository>(
    tx: &mut T,
    id: ApplicationId,
) -> Result<CampaignApplication> {
    tx.application(id)
        .await?
        .ok_or_else(|| MarketplaceError::not_found("Application", id))
}

/// Service for the application state machine
pub struct ApplicationService<S, D> {
    store: S,
    directory: D,
    ctx: ServiceContext,
}

impl<S, D> ApplicationService<S, D>
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

    /// Apply to an active campaign whose date window contains now
    ///
    /// # Arguments
    ///
    /// * `campaign_id` - The campaign to promote
    /// * `marketer_id` - The applying marketer
    ///
    /// # Returns
    ///
    /// The new application in `Pending`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the campaign or marketer does not exist
    /// - `InvalidOperation` if the campaign is not active or outside its window
    /// - `Conflict` if the marketer already applied, whatever the outcome was
    #[instrument(skip(self), fields(campaign_id = %campaign_id, marketer_id = %marketer_id))]
    pub async fn apply(
        &self,
        campaign_id: CampaignId,
        marketer_id: MarketerId,
    ) -> Result<CampaignApplication> {
        self.directory
            .marketer(marketer_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Marketer", marketer_id))?;

        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let campaign = load_live_campaign(&mut tx, campaign_id).await?;
        if campaign.status != CampaignStatus::Active {
            return Err(MarketplaceError::invalid_operation(format!(
                "campaign {} is {} and not accepting applications",
                campaign_id, campaign.status
            )));
        }
        if !campaign.is_within_window(now) {
            return Err(MarketplaceError::invalid_operation(format!(
                "campaign {} runs from {} to {}",
                campaign_id, campaign.start_date, campaign.end_date
            )));
        }

        if let Some(existing) = tx.application_for(campaign_id, marketer_id).await? {
            debug!(application_id = %existing.id, status = %existing.status, "Duplicate application");
            return Err(MarketplaceError::conflict(format!(
                "marketer {} already applied to campaign {}",
                marketer_id, campaign_id
            )));
        }

        let application = CampaignApplication::new(campaign_id, marketer_id, now);
        tx.insert_application(&application).await?;
        tx.commit().await?;

        info!(application_id = %application.id, "Application submitted");
        self.ctx.audit(AuditEntry::new(
            Actor::Marketer(marketer_id),
            "application.submitted",
            "CampaignApplication",
            application.id,
        ));
        self.notify_company(
            campaign.company_id,
            "New application",
            format!("A marketer applied to \"{}\".", campaign.title),
            application.id,
        )
        .await;

        Ok(application)
    }

    /// The applicant withdraws a pending application
    ///
    /// # Errors
    ///
    /// - `NotFound` if the application does not exist
    /// - `Forbidden` if `marketer_id` is not the applicant
    /// - `InvalidOperation` if the application is no longer pending
    #[instrument(skip(self), fields(application_id = %id, marketer_id = %marketer_id))]
    pub async fn withdraw(
        &self,
        id: ApplicationId,
        marketer_id: MarketerId,
    ) -> Result<CampaignApplication> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut application = load_application(&mut tx, id).await?;
        if application.marketer_id != marketer_id {
            return Err(MarketplaceError::forbidden(
                "only the applicant can withdraw an application",
            ));
        }

        let previous = application.decide(ApplicationTransition::Withdraw, None, now)?;

        tx.update_application(&application).await?;
        tx.commit().await?;

        info!("Application withdrawn");
        self.ctx.audit(
            AuditEntry::new(
                Actor::Marketer(marketer_id),
                "application.withdrawn",
                "CampaignApplication",
                id,
            )
            .status_change(previous, application.status),
        );

        Ok(application)
    }

    /// The campaign owner accepts an application and the marketer's tracking
    /// link is issued, or reused if the pair already has one
    ///
    /// # Arguments
    ///
    /// * `id` - The application to accept
    /// * `company_id` - The acting company, which must own the campaign
    /// * `note` - Optional response shown to the marketer
    ///
    /// # Returns
    ///
    /// The application in `Approved` together with the marketer's tracking link
    ///
    /// # Errors
    ///
    /// - `NotFound` if the application or campaign does not exist, or the campaign is archived
    /// - `Forbidden` if `company_id` does not own the campaign
    /// - `InvalidOperation` if the application is no longer pending
    /// - `Conflict` if the generated token collides; nothing is persisted
    #[instrument(skip(self, note), fields(application_id = %id, company_id = %company_id))]
    pub async fn approve(
        &self,
        id: ApplicationId,
        company_id: CompanyId,
        note: Option<String>,
    ) -> Result<ApprovedApplication> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut application = load_application(&mut tx, id).await?;
        let campaign = load_live_campaign(&mut tx, application.campaign_id).await?;
        if !campaign.is_owned_by(company_id) {
            return Err(MarketplaceError::forbidden(
                "only the campaign owner can decide on applications",
            ));
        }

        let previous = application.decide(ApplicationTransition::Approve, note, now)?;
        tx.update_application(&application).await?;

        let (tracking_link, link_created) = match tx
            .tracking_link_for(application.campaign_id, application.marketer_id)
            .await?
        {
            Some(existing) => (existing, false),
            None => {
                let token = self.ctx.tokens.generate(
                    application.marketer_id,
                    application.campaign_id,
                    now,
                );
                let link = TrackingLink::new(
                    application.campaign_id,
                    application.marketer_id,
                    token,
                    now,
                );
                tx.insert_tracking_link(&link).await?;
                (link, true)
            }
        };

        tx.commit().await?;

        info!(
            tracking_link_id = %tracking_link.id,
            link_created,
            "Application approved"
        );
        self.ctx.audit(
            AuditEntry::new(
                Actor::Company(company_id),
                "application.approved",
                "CampaignApplication",
                id,
            )
            .status_change(previous, application.status),
        );
        self.notify_marketer(
            application.marketer_id,
            "Application approved",
            format!(
                "You can now promote \"{}\" with your tracking link.",
                campaign.title
            ),
            id,
        )
        .await;

        Ok(ApprovedApplication {
            application,
            tracking_link,
            link_created,
        })
    }

    /// The campaign owner rejects an application; the note is mandatory
    ///
    /// # Arguments
    ///
    /// * `id` - The application to refuse
    /// * `company_id` - The acting company, which must own the campaign
    /// * `note` - Reason shown to the marketer
    ///
    /// # Returns
    ///
    /// The application in `Rejected`
    ///
    /// # Errors
    ///
    /// - `Validation` if `note` is blank
    /// - `NotFound` if the application or campaign does not exist, or the campaign is archived
    /// - `Forbidden` if `company_id` does not own the campaign
    /// - `InvalidOperation` if the application is no longer pending
    #[instrument(skip(self, note), fields(application_id = %id, company_id = %company_id))]
    pub async fn reject(
        &self,
        id: ApplicationId,
        company_id: CompanyId,
        note: &str,
    ) -> Result<CampaignApplication> {
        let note = note.trim();
        if note.is_empty() {
            return Err(MarketplaceError::validation(
                "a rejection note is required",
            ));
        }

        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut application = load_application(&mut tx, id).await?;
        let campaign = load_live_campaign(&mut tx, application.campaign_id).await?;
        if !campaign.is_owned_by(company_id) {
            return Err(MarketplaceError::forbidden(
                "only the campaign owner can decide on applications",
            ));
        }

        let previous =
            application.decide(ApplicationTransition::Reject, Some(note.to_string()), now)?;

        tx.update_application(&application).await?;
        tx.commit().await?;

        info!("Application rejected");
        self.ctx.audit(
            AuditEntry::new(
                Actor::Company(company_id),
                "application.rejected",
                "CampaignApplication",
                id,
            )
            .status_change(previous, application.status),
        );
        self.notify_marketer(
            application.marketer_id,
            "Application rejected",
            format!("Your application to \"{}\" was rejected: {}", campaign.title, note),
            id,
        )
        .await;

        Ok(application)
    }

    pub async fn get(&self, id: ApplicationId) -> Result<CampaignApplication> {
        let mut tx = self.store.begin().await?;
        load_application(&mut tx, id).await
    }

    /// Applications to a campaign, visible to its owner only
    ///
    /// # Errors
    ///
    /// - `NotFound` if the campaign does not exist
    /// - `Forbidden` if `company_id` does not own the campaign
    pub async fn list_for_campaign(
        &self,
        campaign_id: CampaignId,
        company_id: CompanyId,
    ) -> Result<Vec<CampaignApplication>> {
        let mut tx = self.store.begin().await?;

        let campaign = load_live_campaign(&mut tx, campaign_id).await?;
        if !campaign.is_owned_by(company_id) {
            return Err(MarketplaceError::forbidden(
                "only the campaign owner can list its applications",
            ));
        }

        tx.applications_for_campaign(campaign_id).await
    }

    pub async fn list_for_marketer(
        &self,
        marketer_id: MarketerId,
    ) -> Result<Vec<CampaignApplication>> {
        let mut tx = self.store.begin().await?;
        tx.applications_for_marketer(marketer_id).await
    }

    async fn notify_company(
        &self,
        company_id: CompanyId,
        title: &str,
        body: String,
        related: ApplicationId,
    ) {
        match self.directory.company(company_id).await {
            Ok(Some(company)) => self.ctx.notify(
                company.user_id,
                NotificationKind::Application,
                title,
                body,
                related,
            ),
            Ok(None) => warn!(company_id = %company_id, "Company vanished, notification dropped"),
            Err(err) => warn!(error = %err, "Directory lookup failed, notification dropped"),
        }
    }

    async fn notify_marketer(
        &self,
        marketer_id: MarketerId,
        title: &str,
        body: String,
        related: ApplicationId,
    ) {
        match self.directory.marketer(marketer_id).await {
            Ok(Some(marketer)) => self.ctx.notify(
                marketer.user_id,
                NotificationKind::Application,
                title,
                body,
                related,
            ),
            Ok(None) => warn!(marketer_id = %marketer_id, "Marketer vanished, notification dropped"),
            Err(err) => warn!(error = %err, "Directory lookup failed, notification dropped"),
        }
    }
}
