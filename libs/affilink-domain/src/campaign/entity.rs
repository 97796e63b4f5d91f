//! Campaign entity and the inputs that create or edit it

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::status::{CampaignStatus, CampaignTransition};
use crate::config::ensure_money_scale;
use crate::error::{MarketplaceError, Result};
use crate::ids::{AdminId, CampaignId, CategoryId, CompanyId};

/// How a campaign pays its marketers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    /// `commission_value` is a percentage of the sale, in `(0, 100]`
    Percentage,
    /// `commission_value` is a flat amount per conversion
    Fixed,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionType::Percentage => "percentage",
            CommissionType::Fixed => "fixed",
        }
    }
}

impl fmt::Display for CommissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommissionType {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "percentage" => Ok(CommissionType::Percentage),
            "fixed" => Ok(CommissionType::Fixed),
            other => Err(MarketplaceError::integrity(format!(
                "unknown commission type '{}'",
                other
            ))),
        }
    }
}

/// A campaign published by a company
///
/// Status changes go through [`Campaign::transition`], which consults the
/// transition table in [`CampaignStatus::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub company_id: CompanyId,
    pub category_id: CategoryId,
    pub title: String,
    pub description: String,
    pub promotional_materials: Option<String>,
    pub commission_type: CommissionType,
    pub commission_value: Decimal,
    pub budget: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: CampaignStatus,
    pub approved_by: Option<AdminId>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Tombstone set when a campaign with history is deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Build a new campaign from validated input; always starts `Pending`
    pub fn new(company_id: CompanyId, input: NewCampaign, now: DateTime<Utc>) -> Self {
        Self {
            id: CampaignId::new(),
            company_id,
            category_id: input.category_id,
            title: input.title.trim().to_string(),
            description: input.description,
            promotional_materials: input.promotional_materials,
            commission_type: input.commission_type,
            commission_value: input.commission_value,
            budget: input.budget,
            start_date: input.start_date,
            end_date: input.end_date,
            status: CampaignStatus::Pending,
            approved_by: None,
            review_note: None,
            created_at: now,
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Move along one edge of the lifecycle, returning the previous status
    pub fn transition(
        &mut self,
        transition: CampaignTransition,
        now: DateTime<Utc>,
    ) -> Result<CampaignStatus> {
        let previous = self.status;
        self.status = previous.apply(transition)?;
        self.updated_at = Some(now);
        Ok(previous)
    }

    pub fn is_owned_by(&self, company_id: CompanyId) -> bool {
        self.company_id == company_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `now` falls inside `[start_date, end_date]`
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }
}

/// Input for creating a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub commission_type: CommissionType,
    pub commission_value: Decimal,
    pub budget: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub promotional_materials: Option<String>,
}

impl NewCampaign {
    /// Check the input against the creation rules at time `now`
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(MarketplaceError::validation("title must not be empty"));
        }
        validate_dates(self.start_date, self.end_date)?;
        if self.start_date.date_naive() < now.date_naive() {
            return Err(MarketplaceError::validation(
                "start date must not be in the past",
            ));
        }
        validate_commission(self.commission_type, self.commission_value)?;
        validate_budget(self.budget)
    }
}

/// Partial edit of a campaign; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub commission_type: Option<CommissionType>,
    pub commission_value: Option<Decimal>,
    pub budget: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub promotional_materials: Option<String>,
}

impl CampaignUpdate {
    /// Whether the update would change a field that defines what marketers
    /// signed up for (title, dates, category, commission, budget)
    pub fn changes_identity_of(&self, campaign: &Campaign) -> bool {
        fn differs<T: PartialEq>(new: &Option<T>, current: &T) -> bool {
            new.as_ref().is_some_and(|value| value != current)
        }

        differs(&self.title, &campaign.title)
            || differs(&self.category_id, &campaign.category_id)
            || differs(&self.commission_type, &campaign.commission_type)
            || differs(&self.commission_value, &campaign.commission_value)
            || self.budget.is_some_and(|b| Some(b) != campaign.budget)
            || differs(&self.start_date, &campaign.start_date)
            || differs(&self.end_date, &campaign.end_date)
    }

    /// Apply the update to a copy of `campaign`, validating the result
    pub fn apply_to(&self, campaign: &Campaign, now: DateTime<Utc>) -> Result<Campaign> {
        let mut updated = campaign.clone();

        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(MarketplaceError::validation("title must not be empty"));
            }
            updated.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(materials) = &self.promotional_materials {
            updated.promotional_materials = Some(materials.clone());
        }
        if let Some(category_id) = self.category_id {
            updated.category_id = category_id;
        }
        if let Some(commission_type) = self.commission_type {
            updated.commission_type = commission_type;
        }
        if let Some(commission_value) = self.commission_value {
            updated.commission_value = commission_value;
        }
        if let Some(budget) = self.budget {
            updated.budget = Some(budget);
        }
        if let Some(start_date) = self.start_date {
            if start_date != campaign.start_date && start_date.date_naive() < now.date_naive() {
                return Err(MarketplaceError::validation(
                    "start date must not be in the past",
                ));
            }
            updated.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            updated.end_date = end_date;
        }

        validate_dates(updated.start_date, updated.end_date)?;
        validate_commission(updated.commission_type, updated.commission_value)?;
        validate_budget(updated.budget)?;

        updated.updated_at = Some(now);
        Ok(updated)
    }
}

fn validate_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(MarketplaceError::validation(
            "end date must be after start date",
        ));
    }
    Ok(())
}

fn validate_commission(commission_type: CommissionType, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(MarketplaceError::validation(
            "commission value must be positive",
        ));
    }
    ensure_money_scale("commission value", value)?;
    if commission_type == CommissionType::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(MarketplaceError::validation(
            "percentage commission cannot exceed 100",
        ));
    }
    Ok(())
}

fn validate_budget(budget: Option<Decimal>) -> Result<()> {
    match budget {
        Some(b) if b <= Decimal::ZERO => {
            Err(MarketplaceError::validation("budget must be positive"))
        }
        Some(b) => ensure_money_scale("budget", b),
        None => Ok(()),
    }
}
