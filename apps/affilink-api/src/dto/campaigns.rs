//! DTOs for campaign endpoints

use affilink_domain::campaign::{
    Campaign, CampaignStatus, CampaignUpdate, CommissionType, DeleteOutcome, NewCampaign,
};
use affilink_domain::{AdminId, CategoryId, CompanyId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Request body for creating a campaign
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCampaignRequest {
    /// Company that will own the campaign
    pub company_id: Uuid,
    #[schema(example = "Spring sneakers")]
    pub title: String,
    #[schema(example = "Promote the spring collection")]
    pub description: String,
    pub category_id: Uuid,
    /// `percentage` or `fixed`
    #[schema(value_type = String, example = "percentage")]
    pub commission_type: CommissionType,
    #[schema(example = "12.5")]
    pub commission_value: Decimal,
    pub budget: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub promotional_materials: Option<String>,
}

impl CreateCampaignRequest {
    pub fn into_parts(self) -> (CompanyId, NewCampaign) {
        let input = NewCampaign {
            title: self.title,
            description: self.description,
            category_id: CategoryId::from_uuid(self.category_id),
            commission_type: self.commission_type,
            commission_value: self.commission_value,
            budget: self.budget,
            start_date: self.start_date,
            end_date: self.end_date,
            promotional_materials: self.promotional_materials,
        };
        (CompanyId::from_uuid(self.company_id), input)
    }
}

/// Partial edit; omitted fields stay unchanged
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCampaignRequest {
    pub company_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(value_type = Option<String>, example = "fixed")]
    pub commission_type: Option<CommissionType>,
    pub commission_value: Option<Decimal>,
    pub budget: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub promotional_materials: Option<String>,
}

impl UpdateCampaignRequest {
    pub fn into_parts(self) -> (CompanyId, CampaignUpdate) {
        let update = CampaignUpdate {
            title: self.title,
            description: self.description,
            category_id: self.category_id.map(CategoryId::from_uuid),
            commission_type: self.commission_type,
            commission_value: self.commission_value,
            budget: self.budget,
            start_date: self.start_date,
            end_date: self.end_date,
            promotional_materials: self.promotional_materials,
        };
        (CompanyId::from_uuid(self.company_id), update)
    }
}

/// Admin approval
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveCampaignRequest {
    pub admin_id: Uuid,
}

impl ApproveCampaignRequest {
    pub fn admin(&self) -> AdminId {
        AdminId::from_uuid(self.admin_id)
    }
}

/// Admin rejection; the note is mandatory
#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectCampaignRequest {
    pub admin_id: Uuid,
    #[schema(example = "Landing page makes unverifiable health claims")]
    pub note: String,
}

/// An owner action that needs nothing but the company id
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompanyActionRequest {
    pub company_id: Uuid,
}

impl CompanyActionRequest {
    pub fn company(&self) -> CompanyId {
        CompanyId::from_uuid(self.company_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub company_id: Uuid,
    /// `active`, `paused`, `completed` or `inactive`
    #[schema(value_type = String, example = "paused")]
    pub status: CampaignStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompanyQuery {
    /// Company acting on the resource
    pub company_id: Uuid,
}

impl CompanyQuery {
    pub fn company(&self) -> CompanyId {
        CompanyId::from_uuid(self.company_id)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub promotional_materials: Option<String>,
    #[schema(example = "percentage")]
    pub commission_type: String,
    pub commission_value: Decimal,
    pub budget: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[schema(example = "pending")]
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Campaign> for CampaignResponse {
    fn from(campaign: Campaign) -> Self {
        Self {
            id: campaign.id.into(),
            company_id: campaign.company_id.into(),
            category_id: campaign.category_id.into(),
            title: campaign.title,
            description: campaign.description,
            promotional_materials: campaign.promotional_materials,
            commission_type: campaign.commission_type.as_str().to_string(),
            commission_value: campaign.commission_value,
            budget: campaign.budget,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            status: campaign.status.as_str().to_string(),
            approved_by: campaign.approved_by.map(Uuid::from),
            review_note: campaign.review_note,
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteCampaignResponse {
    /// `removed` when the row was deleted, `archived` when history kept it
    #[schema(example = "archived")]
    pub outcome: String,
}

impl From<DeleteOutcome> for DeleteCampaignResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        let outcome = match outcome {
            DeleteOutcome::Removed => "removed",
            DeleteOutcome::Archived => "archived",
        };
        Self {
            outcome: outcome.to_string(),
        }
    }
}
