//! Withdrawal requests and their settlement lifecycle

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarketplaceError, Result};
use crate::ids::{AdminId, MarketerId, PaymentMethodId, WithdrawalId};

/// Settlement status of a withdrawal request
///
/// ```text
/// Pending ──approve──▶ Approved ──start──▶ Processing
///    │                  │    └──────┬──────────┘
///    └──reject──▶ Rejected          ├──complete──▶ Completed
///                                   └──fail──────▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WithdrawalTransition {
    /// Admin accepts the request
    Approve,
    /// Admin declines the request
    Reject,
    /// External transfer picked the request up
    StartTransfer,
    /// External transfer succeeded
    Complete,
    /// External transfer failed
    Fail,
}

impl WithdrawalStatus {
    pub fn apply(self, transition: WithdrawalTransition) -> Result<WithdrawalStatus> {
        use WithdrawalStatus::*;
        use WithdrawalTransition as T;

        match (self, transition) {
            (Pending, T::Approve) => Ok(Approved),
            (Pending, T::Reject) => Ok(Rejected),
            (Approved, T::StartTransfer) => Ok(Processing),
            (Approved | Processing, T::Complete) => Ok(Completed),
            (Approved | Processing, T::Fail) => Ok(Failed),
            (from, transition) => Err(MarketplaceError::invalid_operation(format!(
                "cannot {} a withdrawal in status {}",
                transition, from
            ))),
        }
    }

    /// Reserved against the balance but not yet settled
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            WithdrawalStatus::Pending | WithdrawalStatus::Approved | WithdrawalStatus::Processing
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WithdrawalStatus::Rejected | WithdrawalStatus::Completed | WithdrawalStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            "processing" => Ok(WithdrawalStatus::Processing),
            "completed" => Ok(WithdrawalStatus::Completed),
            "failed" => Ok(WithdrawalStatus::Failed),
            other => Err(MarketplaceError::integrity(format!(
                "unknown withdrawal status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for WithdrawalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WithdrawalTransition::Approve => "approve",
            WithdrawalTransition::Reject => "reject",
            WithdrawalTransition::StartTransfer => "start the transfer of",
            WithdrawalTransition::Complete => "complete",
            WithdrawalTransition::Fail => "fail",
        })
    }
}

/// A marketer's request to pay out part of the available balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub marketer_id: MarketerId,
    pub amount: Decimal,
    pub payment_method_id: PaymentMethodId,
    pub status: WithdrawalStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<AdminId>,
    pub rejection_reason: Option<String>,
    /// Why the external transfer failed
    pub failure_reason: Option<String>,
    pub admin_notes: Option<String>,
    pub transaction_id: Option<String>,
}

impl WithdrawalRequest {
    pub fn new(
        marketer_id: MarketerId,
        amount: Decimal,
        payment_method_id: PaymentMethodId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WithdrawalId::new(),
            marketer_id,
            amount,
            payment_method_id,
            status: WithdrawalStatus::Pending,
            requested_at: now,
            processed_at: None,
            processed_by: None,
            rejection_reason: None,
            failure_reason: None,
            admin_notes: None,
            transaction_id: None,
        }
    }

    /// Apply a transition, returning the previous status
    pub fn transition(&mut self, transition: WithdrawalTransition) -> Result<WithdrawalStatus> {
        let previous = self.status;
        self.status = previous.apply(transition)?;
        Ok(previous)
    }

    /// Stamp the admin decision metadata
    pub fn stamp_review(&mut self, admin_id: AdminId, notes: Option<String>, now: DateTime<Utc>) {
        self.processed_by = Some(admin_id);
        self.processed_at = Some(now);
        self.admin_notes = notes.filter(|n| !n.trim().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_review_only_from_pending() {
        use WithdrawalStatus::*;

        for status in [Approved, Rejected, Processing, Completed, Failed] {
            let err = status.apply(WithdrawalTransition::Approve).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidOperation);
            assert!(status.apply(WithdrawalTransition::Reject).is_err());
        }
    }

    #[test]
    fn test_transfer_outcomes_map_to_completed_or_failed() {
        use WithdrawalStatus::*;

        assert_eq!(Approved.apply(WithdrawalTransition::Complete).unwrap(), Completed);
        assert_eq!(Processing.apply(WithdrawalTransition::Complete).unwrap(), Completed);
        assert_eq!(Approved.apply(WithdrawalTransition::Fail).unwrap(), Failed);
        assert_eq!(Processing.apply(WithdrawalTransition::Fail).unwrap(), Failed);
        assert!(Pending.apply(WithdrawalTransition::Complete).is_err());
        assert!(Rejected.apply(WithdrawalTransition::Fail).is_err());
    }

    #[test]
    fn test_in_flight_statuses() {
        use WithdrawalStatus::*;

        assert!(Pending.is_in_flight());
        assert!(Approved.is_in_flight());
        assert!(Processing.is_in_flight());
        assert!(!Rejected.is_in_flight());
        assert!(!Completed.is_in_flight());
        assert!(!Failed.is_in_flight());
    }

    #[test]
    fn test_failed_transition_leaves_request_unchanged() {
        let mut request =
            WithdrawalRequest::new(MarketerId::new(), dec!(50), PaymentMethodId::new(), Utc::now());
        request.transition(WithdrawalTransition::Reject).unwrap();
        let snapshot = request.clone();

        assert!(request.transition(WithdrawalTransition::Approve).is_err());
        assert_eq!(request, snapshot);
    }
}
