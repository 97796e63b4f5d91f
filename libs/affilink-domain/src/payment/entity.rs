//! Payment rows: commissions earned and withdrawal mirrors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarketplaceError, Result};
use crate::ids::{CampaignId, PaymentId, UserId, WithdrawalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Commission,
    Withdrawal,
    Refund,
    Bonus,
    Adjustment,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Commission => "commission",
            PaymentType::Withdrawal => "withdrawal",
            PaymentType::Refund => "refund",
            PaymentType::Bonus => "bonus",
            PaymentType::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "commission" => Ok(PaymentType::Commission),
            "withdrawal" => Ok(PaymentType::Withdrawal),
            "refund" => Ok(PaymentType::Refund),
            "bonus" => Ok(PaymentType::Bonus),
            "adjustment" => Ok(PaymentType::Adjustment),
            other => Err(MarketplaceError::integrity(format!(
                "unknown payment type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// Closed transition table for payments
    pub fn advance(self, to: PaymentStatus) -> Result<PaymentStatus> {
        use PaymentStatus::*;

        match (self, to) {
            (Pending, Processing | Completed | Failed | Cancelled) => Ok(to),
            (Processing, Completed | Failed) => Ok(to),
            (from, to) => Err(MarketplaceError::invalid_operation(format!(
                "payment cannot move from {} to {}",
                from, to
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(MarketplaceError::integrity(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// A money movement attributed to a user
///
/// Completed commission payments are the authoritative source of a
/// marketer's gross earnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub campaign_id: Option<CampaignId>,
    /// Set on the mirror row of an approved withdrawal
    pub withdrawal_id: Option<WithdrawalId>,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// A pending commission accrued by a conversion
    pub fn commission(
        user_id: UserId,
        campaign_id: CampaignId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            campaign_id: Some(campaign_id),
            withdrawal_id: None,
            amount,
            payment_type: PaymentType::Commission,
            status: PaymentStatus::Pending,
            transaction_id: None,
            created_at: now,
            completed_at: None,
        }
    }

    /// The processing mirror of an approved withdrawal
    pub fn withdrawal_mirror(
        user_id: UserId,
        withdrawal_id: WithdrawalId,
        amount: Decimal,
        transaction_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            campaign_id: None,
            withdrawal_id: Some(withdrawal_id),
            amount,
            payment_type: PaymentType::Withdrawal,
            status: PaymentStatus::Processing,
            transaction_id,
            created_at: now,
            completed_at: None,
        }
    }

    /// Advance the status, stamping `completed_at` on completion
    pub fn advance(&mut self, to: PaymentStatus, now: DateTime<Utc>) -> Result<PaymentStatus> {
        let previous = self.status;
        self.status = previous.advance(to)?;
        if to == PaymentStatus::Completed {
            self.completed_at = Some(now);
        }
        Ok(previous)
    }
}
