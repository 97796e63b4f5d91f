//! DTOs for application endpoints

use affilink_domain::application::{ApprovedApplication, CampaignApplication};
use affilink_domain::{CompanyId, MarketerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::tracking::TrackingLinkResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyRequest {
    pub marketer_id: Uuid,
}

/// A marketer acting on their own application or link
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarketerActionRequest {
    pub marketer_id: Uuid,
}

impl MarketerActionRequest {
    pub fn marketer(&self) -> MarketerId {
        MarketerId::from_uuid(self.marketer_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveApplicationRequest {
    pub company_id: Uuid,
    pub note: Option<String>,
}

impl ApproveApplicationRequest {
    pub fn company(&self) -> CompanyId {
        CompanyId::from_uuid(self.company_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectApplicationRequest {
    pub company_id: Uuid,
    #[schema(example = "Audience does not match the product")]
    pub note: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub marketer_id: Uuid,
    #[schema(example = "pending")]
    pub status: String,
    pub ai_match_score: Option<Decimal>,
    pub applied_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub response_note: Option<String>,
}

impl From<CampaignApplication> for ApplicationResponse {
    fn from(application: CampaignApplication) -> Self {
        Self {
            id: application.id.into(),
            campaign_id: application.campaign_id.into(),
            marketer_id: application.marketer_id.into(),
            status: application.status.as_str().to_string(),
            ai_match_score: application.ai_match_score,
            applied_at: application.applied_at,
            responded_at: application.responded_at,
            response_note: application.response_note,
        }
    }
}

/// The accepted application and the marketer's tracking link
#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovedApplicationResponse {
    pub application: ApplicationResponse,
    pub tracking_link: TrackingLinkResponse,
    /// False when an existing link for the pair was reused
    pub link_created: bool,
}

impl From<ApprovedApplication> for ApprovedApplicationResponse {
    fn from(approved: ApprovedApplication) -> Self {
        Self {
            application: approved.application.into(),
            tracking_link: approved.tracking_link.into(),
            link_created: approved.link_created,
        }
    }
}
