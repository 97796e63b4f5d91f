//! DTOs for tracking endpoints

use affilink_domain::tracking::{
    CampaignEarnings, CampaignPerformance, EventType, LinkStats, PerformanceLog, TrackingLink,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An attribution event reported by the redirect or checkout side
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordEventRequest {
    /// `impression`, `click`, `lead` or `conversion`
    #[schema(value_type = String, example = "conversion")]
    pub event_type: EventType,
    /// Commission earned; only conversions may carry a non-zero amount
    #[serde(default)]
    #[schema(example = "7.50")]
    pub amount_earned: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingLinkResponse {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub marketer_id: Uuid,
    #[schema(example = "Qm9vdHNfYXV0dW1u")]
    pub token: String,
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TrackingLink> for TrackingLinkResponse {
    fn from(link: TrackingLink) -> Self {
        Self {
            id: link.id.into(),
            campaign_id: link.campaign_id.into(),
            marketer_id: link.marketer_id.into(),
            token: link.token,
            clicks: link.clicks,
            conversions: link.conversions,
            earnings: link.earnings,
            is_active: link.is_active,
            created_at: link.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkStatsResponse {
    pub tracking_link_id: Uuid,
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: Decimal,
    /// Percentage of clicks that converted
    #[schema(example = "25")]
    pub conversion_rate: Decimal,
}

impl From<LinkStats> for LinkStatsResponse {
    fn from(stats: LinkStats) -> Self {
        Self {
            tracking_link_id: stats.tracking_link_id.into(),
            clicks: stats.clicks,
            conversions: stats.conversions,
            earnings: stats.earnings,
            conversion_rate: stats.conversion_rate,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CampaignPerformanceResponse {
    pub campaign_id: Uuid,
    pub links: usize,
    pub active_links: usize,
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: Decimal,
    pub conversion_rate: Decimal,
}

impl From<CampaignPerformance> for CampaignPerformanceResponse {
    fn from(performance: CampaignPerformance) -> Self {
        Self {
            campaign_id: performance.campaign_id.into(),
            links: performance.links,
            active_links: performance.active_links,
            clicks: performance.clicks,
            conversions: performance.conversions,
            earnings: performance.earnings,
            conversion_rate: performance.conversion_rate,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CampaignEarningsResponse {
    pub campaign_id: Uuid,
    pub earnings: Decimal,
    pub conversions: i64,
}

impl From<CampaignEarnings> for CampaignEarningsResponse {
    fn from(earnings: CampaignEarnings) -> Self {
        Self {
            campaign_id: earnings.campaign_id.into(),
            earnings: earnings.earnings,
            conversions: earnings.conversions,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PerformanceLogResponse {
    pub id: Uuid,
    pub tracking_link_id: Uuid,
    #[schema(example = "click")]
    pub event_type: String,
    pub amount_earned: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl From<PerformanceLog> for PerformanceLogResponse {
    fn from(entry: PerformanceLog) -> Self {
        Self {
            id: entry.id.into(),
            tracking_link_id: entry.tracking_link_id.into(),
            event_type: entry.event_type.as_str().to_string(),
            amount_earned: entry.amount_earned,
            recorded_at: entry.recorded_at,
        }
    }
}
