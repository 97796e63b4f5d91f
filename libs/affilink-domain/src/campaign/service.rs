//! Campaign service - lifecycle orchestration
//!
//! Each operation opens one unit of work, checks ownership, asks the
//! transition table for the next status and commits. Audit entries and
//! notifications are emitted only after a successful commit.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::entity::{Campaign, CampaignUpdate, NewCampaign};
use super::status::{CampaignStatus, CampaignTransition};
use crate::context::ServiceContext;
use crate::error::{MarketplaceError, Result};
use crate::ids::{AdminId, CampaignId, CompanyId};
use crate::ports::{
    Actor, AuditEntry, CampaignRepository, Directory, MarketplaceStore, NotificationKind,
    UnitOfWork,
};

/// What `delete` did with the campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// No history referenced it; the row is gone
    Removed,
    /// Applications or tracking links reference it; a tombstone was set
    Archived,
}

/// Load a campaign that has not been tombstoned
pub(crate) async fn load_live_campaign<T: CampaignRepository>(
    tx: &mut T,
    id: CampaignId,
) -> Result<Campaign> {
    tx.campaign(id)
        .await?
        .filter(|campaign| !campaign.is_deleted())
        .ok_or_else(|| MarketplaceError::not_found("Campaign", id))
}

fn ensure_owner(campaign: &Campaign, company_id: CompanyId) -> Result<()> {
    if !campaign.is_owned_by(company_id) {
        warn!(campaign_id = %campaign.id, company_id = %company_id, "Company does not own campaign");
        return Err(MarketplaceError::forbidden(format!(
            "campaign {} does not belong to company {}",
            campaign.id, company_id
        )));
    }
    Ok(())
}

/// Service for the campaign state machine
pub struct CampaignService<S, D> {
    store: S,
    directory: D,
    ctx: ServiceContext,
}

impl<S, D> CampaignService<S, D>
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

    /// Create a campaign; it always starts `Pending` and awaits admin approval
    ///
    /// # Arguments
    ///
    /// * `company_id` - The company that will own the campaign
    /// * `input` - Title, category, commission terms, budget and date window
    ///
    /// # Returns
    ///
    /// The persisted campaign, `Pending` and without an approver
    ///
    /// # Errors
    ///
    /// - `NotFound` if the company or category does not exist
    /// - `Forbidden` if the company is not verified
    /// - `Validation` if the dates, title, commission or budget are invalid
    #[instrument(skip(self, input), fields(company_id = %company_id))]
    pub async fn create(&self, company_id: CompanyId, input: NewCampaign) -> Result<Campaign> {
        let company = self
            .directory
            .company(company_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Company", company_id))?;

        if !company.is_verified {
            return Err(MarketplaceError::forbidden(
                "only verified companies can create campaigns",
            ));
        }

        if !self.directory.category_exists(input.category_id).await? {
            return Err(MarketplaceError::not_found("Category", input.category_id));
        }

        let now = self.ctx.now();
        input.validate(now)?;

        let campaign = Campaign::new(company_id, input, now);

        let mut tx = self.store.begin().await?;
        tx.insert_campaign(&campaign).await?;
        tx.commit().await?;

        info!(campaign_id = %campaign.id, "Campaign created, awaiting approval");
        self.ctx.audit(AuditEntry::new(
            Actor::Company(company_id),
            "campaign.created",
            "Campaign",
            campaign.id,
        ));

        Ok(campaign)
    }

    /// Fetch a campaign that has not been deleted
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown and archived campaigns
    pub async fn get(&self, id: CampaignId) -> Result<Campaign> {
        let mut tx = self.store.begin().await?;
        load_live_campaign(&mut tx, id).await
    }

    /// Live campaigns of a company
    pub async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Campaign>> {
        let mut tx = self.store.begin().await?;
        tx.campaigns_for_company(company_id).await
    }

    /// Admin approval: `Pending → Active`, recording the approver
    ///
    /// # Arguments
    ///
    /// * `id` - The campaign under review
    /// * `admin_id` - The approving admin, stored as `approved_by`
    ///
    /// # Returns
    ///
    /// The campaign in `Active`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the campaign does not exist
    /// - `InvalidOperation` if the campaign is not `Pending`
    #[instrument(skip(self), fields(campaign_id = %id, admin_id = %admin_id))]
    pub async fn approve(&self, id: CampaignId, admin_id: AdminId) -> Result<Campaign> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut campaign = load_live_campaign(&mut tx, id).await?;
        let previous = campaign.transition(CampaignTransition::Approve, now)?;
        campaign.approved_by = Some(admin_id);

        tx.update_campaign(&campaign).await?;
        tx.commit().await?;

        info!(from = %previous, to = %campaign.status, "Campaign approved");
        self.ctx.audit(
            AuditEntry::new(Actor::Admin(admin_id), "campaign.approved", "Campaign", id)
                .status_change(previous, campaign.status),
        );
        self.notify_owner(
            &campaign,
            "Campaign approved",
            format!("Your campaign \"{}\" is now live.", campaign.title),
        )
        .await;

        Ok(campaign)
    }

    /// Admin rejection: `Pending → Rejected`; the note is mandatory
    ///
    /// # Arguments
    ///
    /// * `id` - The campaign under review
    /// * `admin_id` - The rejecting admin
    /// * `note` - Reason shown to the company
    ///
    /// # Returns
    ///
    /// The campaign in `Rejected`
    ///
    /// # Errors
    ///
    /// - `Validation` if `note` is blank
    /// - `NotFound` if the campaign does not exist
    /// - `InvalidOperation` if the campaign is not `Pending`
    #[instrument(skip(self, note), fields(campaign_id = %id, admin_id = %admin_id))]
    pub async fn reject(&self, id: CampaignId, admin_id: AdminId, note: &str) -> Result<Campaign> {
        let note = note.trim();
        if note.is_empty() {
            return Err(MarketplaceError::validation(
                "a rejection note is required",
            ));
        }

        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut campaign = load_live_campaign(&mut tx, id).await?;
        let previous = campaign.transition(CampaignTransition::Reject, now)?;
        campaign.review_note = Some(note.to_string());

        tx.update_campaign(&campaign).await?;
        tx.commit().await?;

        info!(from = %previous, to = %campaign.status, "Campaign rejected");
        self.ctx.audit(
            AuditEntry::new(Actor::Admin(admin_id), "campaign.rejected", "Campaign", id)
                .status_change(previous, campaign.status),
        );
        self.notify_owner(
            &campaign,
            "Campaign rejected",
            format!("Your campaign \"{}\" was rejected: {}", campaign.title, note),
        )
        .await;

        Ok(campaign)
    }

    /// Owner-driven status change; `Pending` and `Rejected` are admin-only
    ///
    /// # Arguments
    ///
    /// * `id` - The campaign to move
    /// * `company_id` - The acting company, which must own the campaign
    /// * `status` - Target status
    ///
    /// # Returns
    ///
    /// The campaign after the transition
    ///
    /// # Errors
    ///
    /// - `Forbidden` for admin-only targets or a foreign campaign
    /// - `InvalidOperation` if the table has no edge to `status`
    /// - `Expired` when reactivating a campaign whose end date has passed
    pub async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
        company_id: CompanyId,
    ) -> Result<Campaign> {
        let transition = CampaignStatus::transition_to(status).ok_or_else(|| {
            MarketplaceError::forbidden(format!(
                "status {} can only be set by an administrator",
                status
            ))
        })?;

        self.owner_transition(id, company_id, transition).await
    }

    /// `Active → Paused`
    ///
    /// # Errors
    ///
    /// - `Forbidden` if `company_id` does not own the campaign
    /// - `InvalidOperation` if the campaign is not `Active`
    pub async fn pause(&self, id: CampaignId, company_id: CompanyId) -> Result<Campaign> {
        self.owner_transition(id, company_id, CampaignTransition::Pause)
            .await
    }

    /// `Paused → Active`, only while the end date has not passed
    ///
    /// # Errors
    ///
    /// - `Forbidden` if `company_id` does not own the campaign
    /// - `InvalidOperation` if the campaign is not `Paused`
    /// - `Expired` if the end date has passed
    pub async fn resume(&self, id: CampaignId, company_id: CompanyId) -> Result<Campaign> {
        self.owner_transition(id, company_id, CampaignTransition::Resume)
            .await
    }

    #[instrument(skip(self), fields(campaign_id = %id, company_id = %company_id))]
    async fn owner_transition(
        &self,
        id: CampaignId,
        company_id: CompanyId,
        transition: CampaignTransition,
    ) -> Result<Campaign> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut campaign = load_live_campaign(&mut tx, id).await?;
        ensure_owner(&campaign, company_id)?;

        // Validate the edge first so a wrong status wins over expiry
        campaign.status.apply(transition)?;
        if transition == CampaignTransition::Resume && campaign.has_ended(now) {
            return Err(MarketplaceError::expired(format!(
                "campaign {} ended on {}",
                id, campaign.end_date
            )));
        }

        let previous = campaign.transition(transition, now)?;

        tx.update_campaign(&campaign).await?;
        tx.commit().await?;

        info!(from = %previous, to = %campaign.status, "Campaign status changed");
        self.ctx.audit(
            AuditEntry::new(
                Actor::Company(company_id),
                "campaign.status_changed",
                "Campaign",
                id,
            )
            .status_change(previous, campaign.status),
        );

        Ok(campaign)
    }

    /// Edit a campaign
    ///
    /// Completed and rejected campaigns are immutable. Active campaigns accept
    /// only description and promotional material changes.
    ///
    /// # Arguments
    ///
    /// * `id` - The campaign to edit
    /// * `company_id` - The acting company, which must own the campaign
    /// * `update` - Fields to change; `None` keeps the current value
    ///
    /// # Returns
    ///
    /// The campaign as persisted after the edit
    ///
    /// # Errors
    ///
    /// - `Forbidden` for a foreign campaign or an identity change while `Active`
    /// - `InvalidOperation` for a completed or rejected campaign
    /// - `NotFound` if a new category does not exist
    /// - `Validation` if the edited campaign breaks the creation rules
    #[instrument(skip(self, update), fields(campaign_id = %id, company_id = %company_id))]
    pub async fn update(
        &self,
        id: CampaignId,
        update: CampaignUpdate,
        company_id: CompanyId,
    ) -> Result<Campaign> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let campaign = load_live_campaign(&mut tx, id).await?;
        ensure_owner(&campaign, company_id)?;

        if campaign.status.is_immutable() {
            return Err(MarketplaceError::invalid_operation(format!(
                "campaign {} is {} and can no longer be edited",
                id, campaign.status
            )));
        }

        if campaign.status == CampaignStatus::Active && update.changes_identity_of(&campaign) {
            return Err(MarketplaceError::forbidden(
                "an active campaign only accepts description and promotional material changes",
            ));
        }

        if let Some(category_id) = update.category_id {
            if category_id != campaign.category_id
                && !self.directory.category_exists(category_id).await?
            {
                return Err(MarketplaceError::not_found("Category", category_id));
            }
        }

        let updated = update.apply_to(&campaign, now)?;

        tx.update_campaign(&updated).await?;
        tx.commit().await?;

        info!("Campaign updated");
        self.ctx.audit(AuditEntry::new(
            Actor::Company(company_id),
            "campaign.updated",
            "Campaign",
            id,
        ));

        Ok(updated)
    }

    /// Delete a campaign
    ///
    /// Refused while `Active`. A campaign referenced by applications or
    /// tracking links is archived with a tombstone so the attribution ledger
    /// and balances keep their history; otherwise the row is removed.
    ///
    /// # Returns
    ///
    /// Whether the campaign was removed or archived
    ///
    /// # Errors
    ///
    /// - `Forbidden` if `company_id` does not own the campaign
    /// - `InvalidOperation` if the campaign is `Active`
    #[instrument(skip(self), fields(campaign_id = %id, company_id = %company_id))]
    pub async fn delete(&self, id: CampaignId, company_id: CompanyId) -> Result<DeleteOutcome> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut campaign = load_live_campaign(&mut tx, id).await?;
        ensure_owner(&campaign, company_id)?;

        if campaign.status == CampaignStatus::Active {
            return Err(MarketplaceError::invalid_operation(
                "an active campaign cannot be deleted; pause or complete it first",
            ));
        }

        let outcome = if tx.campaign_has_activity(id).await? {
            campaign.deleted_at = Some(now);
            campaign.updated_at = Some(now);
            tx.update_campaign(&campaign).await?;
            DeleteOutcome::Archived
        } else {
            tx.delete_campaign(id).await?;
            DeleteOutcome::Removed
        };
        tx.commit().await?;

        info!(outcome = ?outcome, "Campaign deleted");
        self.ctx.audit(AuditEntry::new(
            Actor::Company(company_id),
            "campaign.deleted",
            "Campaign",
            id,
        ));

        Ok(outcome)
    }

    async fn notify_owner(&self, campaign: &Campaign, title: &str, body: String) {
        match self.directory.company(campaign.company_id).await {
            Ok(Some(company)) => self.ctx.notify(
                company.user_id,
                NotificationKind::Campaign,
                title,
                body,
                campaign.id,
            ),
            Ok(None) => warn!(company_id = %campaign.company_id, "Campaign owner vanished, notification dropped"),
            Err(err) => warn!(error = %err, "Directory lookup failed, notification dropped"),
        }
    }
}
