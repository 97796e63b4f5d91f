//! Campaign application entity and its lifecycle

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarketplaceError, Result};
use crate::ids::{ApplicationId, CampaignId, MarketerId};

/// Status of a marketer's application; every status but `Pending` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

/// A decision taken on a pending application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationTransition {
    /// Campaign owner accepts
    Approve,
    /// Campaign owner declines
    Reject,
    /// Marketer pulls the application back
    Withdraw,
}

impl ApplicationStatus {
    pub fn apply(self, transition: ApplicationTransition) -> Result<ApplicationStatus> {
        match (self, transition) {
            (ApplicationStatus::Pending, ApplicationTransition::Approve) => {
                Ok(ApplicationStatus::Accepted)
            }
            (ApplicationStatus::Pending, ApplicationTransition::Reject) => {
                Ok(ApplicationStatus::Rejected)
            }
            (ApplicationStatus::Pending, ApplicationTransition::Withdraw) => {
                Ok(ApplicationStatus::Withdrawn)
            }
            (from, transition) => Err(MarketplaceError::invalid_operation(format!(
                "cannot {} an application in status {}",
                transition, from
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(MarketplaceError::integrity(format!(
                "unknown application status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ApplicationTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplicationTransition::Approve => "approve",
            ApplicationTransition::Reject => "reject",
            ApplicationTransition::Withdraw => "withdraw",
        })
    }
}

/// A marketer's request to promote a campaign
///
/// Never deleted; at most one exists per (campaign, marketer) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignApplication {
    pub id: ApplicationId,
    pub campaign_id: CampaignId,
    pub marketer_id: MarketerId,
    pub status: ApplicationStatus,
    /// Populated by an external matching service, never computed here
    pub ai_match_score: Option<Decimal>,
    pub applied_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub response_note: Option<String>,
}

impl CampaignApplication {
    pub fn new(campaign_id: CampaignId, marketer_id: MarketerId, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::new(),
            campaign_id,
            marketer_id,
            status: ApplicationStatus::Pending,
            ai_match_score: None,
            applied_at: now,
            responded_at: None,
            response_note: None,
        }
    }

    /// Apply a decision and stamp the response metadata
    pub fn decide(
        &mut self,
        transition: ApplicationTransition,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationStatus> {
        let previous = self.status;
        self.status = previous.apply(transition)?;
        self.responded_at = Some(now);
        self.response_note = note.filter(|n| !n.trim().is_empty());
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_pending_accepts_every_decision() {
        assert_eq!(
            ApplicationStatus::Pending
                .apply(ApplicationTransition::Approve)
                .unwrap(),
            ApplicationStatus::Accepted
        );
        assert_eq!(
            ApplicationStatus::Pending
                .apply(ApplicationTransition::Reject)
                .unwrap(),
            ApplicationStatus::Rejected
        );
        assert_eq!(
            ApplicationStatus::Pending
                .apply(ApplicationTransition::Withdraw)
                .unwrap(),
            ApplicationStatus::Withdrawn
        );
    }

    #[test]
    fn test_terminal_statuses_reject_all_decisions() {
        let terminal = [
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ];
        let decisions = [
            ApplicationTransition::Approve,
            ApplicationTransition::Reject,
            ApplicationTransition::Withdraw,
        ];

        for status in terminal {
            assert!(status.is_terminal());
            for decision in decisions {
                let err = status.apply(decision).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidOperation);
            }
        }
    }

    #[test]
    fn test_decide_stamps_response() {
        let now = Utc::now();
        let mut application = CampaignApplication::new(CampaignId::new(), MarketerId::new(), now);

        application
            .decide(ApplicationTransition::Reject, Some("audience mismatch".into()), now)
            .unwrap();

        assert_eq!(application.status, ApplicationStatus::Rejected);
        assert_eq!(application.responded_at, Some(now));
        assert_eq!(application.response_note.as_deref(), Some("audience mismatch"));
    }

    #[test]
    fn test_failed_decision_leaves_application_unchanged() {
        let now = Utc::now();
        let mut application = CampaignApplication::new(CampaignId::new(), MarketerId::new(), now);
        application
            .decide(ApplicationTransition::Withdraw, None, now)
            .unwrap();
        let snapshot = application.clone();

        assert!(application
            .decide(ApplicationTransition::Approve, Some("late".into()), now)
            .is_err());
        assert_eq!(application, snapshot);
    }
}
