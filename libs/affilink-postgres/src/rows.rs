//! Row types and their conversion into domain entities
//!
//! Enumerations are stored as their `as_str` text. A value that no longer
//! parses is reported as `MarketplaceError::Integrity`.

use affilink_domain::application::CampaignApplication;
use affilink_domain::campaign::Campaign;
use affilink_domain::payment::Payment;
use affilink_domain::tracking::{PerformanceLog, TrackingLink};
use affilink_domain::withdrawal::{PaymentMethod, WithdrawalRequest};
use affilink_domain::{AdminId, MarketplaceError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub(crate) const CAMPAIGN_COLUMNS: &str = "id, company_id, category_id, title, description, \
     promotional_materials, commission_type, commission_value, budget, start_date, end_date, \
     status, approved_by, review_note, created_at, updated_at, deleted_at";

pub(crate) const APPLICATION_COLUMNS: &str =
    "id, campaign_id, marketer_id, status, ai_match_score, applied_at, responded_at, response_note";

pub(crate) const TRACKING_LINK_COLUMNS: &str =
    "id, campaign_id, marketer_id, token, clicks, conversions, earnings, is_active, created_at";

pub(crate) const PERFORMANCE_LOG_COLUMNS: &str =
    "id, tracking_link_id, event_type, amount_earned, recorded_at";

pub(crate) const PAYMENT_COLUMNS: &str = "id, user_id, campaign_id, withdrawal_id, amount, \
     payment_type, status, transaction_id, created_at, completed_at";

pub(crate) const WITHDRAWAL_COLUMNS: &str = "id, marketer_id, amount, payment_method_id, status, \
     requested_at, processed_at, processed_by, rejection_reason, failure_reason, admin_notes, \
     transaction_id";

pub(crate) const PAYMENT_METHOD_COLUMNS: &str = "id, marketer_id, method_type, account_details, \
     account_holder_name, is_default, is_verified, created_at";

#[derive(Debug, FromRow)]
pub(crate) struct CampaignRow {
    id: Uuid,
    company_id: Uuid,
    category_id: Uuid,
    title: String,
    description: String,
    promotional_materials: Option<String>,
    commission_type: String,
    commission_value: Decimal,
    budget: Option<Decimal>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    approved_by: Option<Uuid>,
    review_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = MarketplaceError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Campaign {
            id: row.id.into(),
            company_id: row.company_id.into(),
            category_id: row.category_id.into(),
            title: row.title,
            description: row.description,
            promotional_materials: row.promotional_materials,
            commission_type: row.commission_type.parse()?,
            commission_value: row.commission_value,
            budget: row.budget,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse()?,
            approved_by: row.approved_by.map(AdminId::from_uuid),
            review_note: row.review_note,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ApplicationRow {
    id: Uuid,
    campaign_id: Uuid,
    marketer_id: Uuid,
    status: String,
    ai_match_score: Option<Decimal>,
    applied_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    response_note: Option<String>,
}

impl TryFrom<ApplicationRow> for CampaignApplication {
    type Error = MarketplaceError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(CampaignApplication {
            id: row.id.into(),
            campaign_id: row.campaign_id.into(),
            marketer_id: row.marketer_id.into(),
            status: row.status.parse()?,
            ai_match_score: row.ai_match_score,
            applied_at: row.applied_at,
            responded_at: row.responded_at,
            response_note: row.response_note,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TrackingLinkRow {
    id: Uuid,
    campaign_id: Uuid,
    marketer_id: Uuid,
    token: String,
    clicks: i64,
    conversions: i64,
    earnings: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<TrackingLinkRow> for TrackingLink {
    fn from(row: TrackingLinkRow) -> Self {
        TrackingLink {
            id: row.id.into(),
            campaign_id: row.campaign_id.into(),
            marketer_id: row.marketer_id.into(),
            token: row.token,
            clicks: row.clicks,
            conversions: row.conversions,
            earnings: row.earnings,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PerformanceLogRow {
    id: Uuid,
    tracking_link_id: Uuid,
    event_type: String,
    amount_earned: Decimal,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<PerformanceLogRow> for PerformanceLog {
    type Error = MarketplaceError;

    fn try_from(row: PerformanceLogRow) -> Result<Self, Self::Error> {
        Ok(PerformanceLog {
            id: row.id.into(),
            tracking_link_id: row.tracking_link_id.into(),
            event_type: row.event_type.parse()?,
            amount_earned: row.amount_earned,
            recorded_at: row.recorded_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    campaign_id: Option<Uuid>,
    withdrawal_id: Option<Uuid>,
    amount: Decimal,
    payment_type: String,
    status: String,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = MarketplaceError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id.into(),
            user_id: row.user_id.into(),
            campaign_id: row.campaign_id.map(Into::into),
            withdrawal_id: row.withdrawal_id.map(Into::into),
            amount: row.amount,
            payment_type: row.payment_type.parse()?,
            status: row.status.parse()?,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct WithdrawalRow {
    id: Uuid,
    marketer_id: Uuid,
    amount: Decimal,
    payment_method_id: Uuid,
    status: String,
    requested_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    processed_by: Option<Uuid>,
    rejection_reason: Option<String>,
    failure_reason: Option<String>,
    admin_notes: Option<String>,
    transaction_id: Option<String>,
}

impl TryFrom<WithdrawalRow> for WithdrawalRequest {
    type Error = MarketplaceError;

    fn try_from(row: WithdrawalRow) -> Result<Self, Self::Error> {
        Ok(WithdrawalRequest {
            id: row.id.into(),
            marketer_id: row.marketer_id.into(),
            amount: row.amount,
            payment_method_id: row.payment_method_id.into(),
            status: row.status.parse()?,
            requested_at: row.requested_at,
            processed_at: row.processed_at,
            processed_by: row.processed_by.map(AdminId::from_uuid),
            rejection_reason: row.rejection_reason,
            failure_reason: row.failure_reason,
            admin_notes: row.admin_notes,
            transaction_id: row.transaction_id,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PaymentMethodRow {
    id: Uuid,
    marketer_id: Uuid,
    method_type: String,
    account_details: String,
    account_holder_name: String,
    is_default: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentMethodRow> for PaymentMethod {
    type Error = MarketplaceError;

    fn try_from(row: PaymentMethodRow) -> Result<Self, Self::Error> {
        Ok(PaymentMethod {
            id: row.id.into(),
            marketer_id: row.marketer_id.into(),
            method_type: row.method_type.parse()?,
            account_details: row.account_details,
            account_holder_name: row.account_holder_name,
            is_default: row.is_default,
            is_verified: row.is_verified,
            created_at: row.created_at,
        })
    }
}

/// Convert a batch of rows, failing on the first one that does not parse
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, MarketplaceError>
where
    T: TryFrom<R, Error = MarketplaceError>,
{
    rows.into_iter().map(T::try_from).collect()
}
