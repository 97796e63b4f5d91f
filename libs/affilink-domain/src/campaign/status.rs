//! Campaign lifecycle states and their transition table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarketplaceError, Result};

/// Lifecycle status of a campaign
///
/// ```text
/// Pending ──approve──▶ Active ◀──resume── Paused
///    │                  │ └────pause────▶   │
///    └──reject──▶ Rejected    Active|Paused ──complete──▶ Completed
/// Pending|Active|Paused ──deactivate──▶ Inactive
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Active,
    Inactive,
    Paused,
    Completed,
    Rejected,
}

/// A requested change of campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CampaignTransition {
    /// Admin-only
    Approve,
    /// Admin-only
    Reject,
    Pause,
    Resume,
    Complete,
    Deactivate,
}

impl CampaignStatus {
    /// Apply a transition, returning the resulting status
    ///
    /// Any pair not listed in the table is an `InvalidOperation`; the caller's
    /// entity is left untouched.
    pub fn apply(self, transition: CampaignTransition) -> Result<CampaignStatus> {
        use CampaignStatus::*;
        use CampaignTransition as T;

        match (self, transition) {
            (Pending, T::Approve) => Ok(Active),
            (Pending, T::Reject) => Ok(Rejected),
            (Active, T::Pause) => Ok(Paused),
            (Paused, T::Resume) => Ok(Active),
            (Active | Paused, T::Complete) => Ok(Completed),
            (Pending | Active | Paused, T::Deactivate) => Ok(Inactive),
            (from, transition) => Err(MarketplaceError::invalid_operation(format!(
                "cannot {} a campaign in status {}",
                transition, from
            ))),
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Completed | CampaignStatus::Rejected | CampaignStatus::Inactive
        )
    }

    /// Completed and rejected campaigns can no longer be edited
    pub fn is_immutable(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Rejected)
    }

    /// Statuses only an administrator may assign
    pub fn is_admin_only(&self) -> bool {
        matches!(self, CampaignStatus::Pending | CampaignStatus::Rejected)
    }

    /// The owner-facing transition that leads to `target`, if any
    pub fn transition_to(target: CampaignStatus) -> Option<CampaignTransition> {
        match target {
            CampaignStatus::Active => Some(CampaignTransition::Resume),
            CampaignStatus::Paused => Some(CampaignTransition::Pause),
            CampaignStatus::Completed => Some(CampaignTransition::Complete),
            CampaignStatus::Inactive => Some(CampaignTransition::Deactivate),
            CampaignStatus::Pending | CampaignStatus::Rejected => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Active => "active",
            CampaignStatus::Inactive => "inactive",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(CampaignStatus::Pending),
            "active" => Ok(CampaignStatus::Active),
            "inactive" => Ok(CampaignStatus::Inactive),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "rejected" => Ok(CampaignStatus::Rejected),
            other => Err(MarketplaceError::integrity(format!(
                "unknown campaign status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CampaignTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            CampaignTransition::Approve => "approve",
            CampaignTransition::Reject => "reject",
            CampaignTransition::Pause => "pause",
            CampaignTransition::Resume => "resume",
            CampaignTransition::Complete => "complete",
            CampaignTransition::Deactivate => "deactivate",
        };
        f.write_str(verb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const ALL_STATUSES: [CampaignStatus; 6] = [
        CampaignStatus::Pending,
        CampaignStatus::Active,
        CampaignStatus::Inactive,
        CampaignStatus::Paused,
        CampaignStatus::Completed,
        CampaignStatus::Rejected,
    ];

    const ALL_TRANSITIONS: [CampaignTransition; 6] = [
        CampaignTransition::Approve,
        CampaignTransition::Reject,
        CampaignTransition::Pause,
        CampaignTransition::Resume,
        CampaignTransition::Complete,
        CampaignTransition::Deactivate,
    ];

    #[test]
    fn test_legal_edges() {
        use CampaignStatus::*;
        use CampaignTransition as T;

        assert_eq!(Pending.apply(T::Approve).unwrap(), Active);
        assert_eq!(Pending.apply(T::Reject).unwrap(), Rejected);
        assert_eq!(Active.apply(T::Pause).unwrap(), Paused);
        assert_eq!(Paused.apply(T::Resume).unwrap(), Active);
        assert_eq!(Active.apply(T::Complete).unwrap(), Completed);
        assert_eq!(Paused.apply(T::Complete).unwrap(), Completed);
        assert_eq!(Pending.apply(T::Deactivate).unwrap(), Inactive);
    }

    #[test]
    fn test_pausing_paused_campaign_is_invalid() {
        let err = CampaignStatus::Paused
            .apply(CampaignTransition::Pause)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(err.to_string().contains("paused"));
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        for status in ALL_STATUSES.iter().filter(|s| s.is_terminal()) {
            for transition in ALL_TRANSITIONS {
                assert!(
                    status.apply(transition).is_err(),
                    "{} should not accept {}",
                    status,
                    transition
                );
            }
        }
    }

    #[test]
    fn test_approval_only_from_pending() {
        for status in ALL_STATUSES {
            let result = status.apply(CampaignTransition::Approve);
            assert_eq!(result.is_ok(), status == CampaignStatus::Pending);
        }
    }

    #[test]
    fn test_owner_cannot_target_admin_statuses() {
        assert!(CampaignStatus::transition_to(CampaignStatus::Pending).is_none());
        assert!(CampaignStatus::transition_to(CampaignStatus::Rejected).is_none());
        assert_eq!(
            CampaignStatus::transition_to(CampaignStatus::Paused),
            Some(CampaignTransition::Pause)
        );
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in ALL_STATUSES {
            assert_eq!(status.as_str().parse::<CampaignStatus>().unwrap(), status);
        }
        assert!("archived".parse::<CampaignStatus>().is_err());
    }
}
