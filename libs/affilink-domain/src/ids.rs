//! Typed identifiers
//!
//! Every aggregate gets its own UUID v7 wrapper so that a `CampaignId` can
//! never be passed where a `MarketerId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new time-ordered identifier
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID value
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(
    /// Identifier of a campaign
    CampaignId
);
typed_id!(
    /// Identifier of a marketer's application to a campaign
    ApplicationId
);
typed_id!(
    /// Identifier of a tracking link
    TrackingLinkId
);
typed_id!(
    /// Identifier of an append-only performance log entry
    PerformanceLogId
);
typed_id!(
    /// Identifier of a payment row
    PaymentId
);
typed_id!(
    /// Identifier of a withdrawal request
    WithdrawalId
);
typed_id!(
    /// Identifier of a marketer's payout method
    PaymentMethodId
);
typed_id!(
    /// Identifier of a company (campaign owner)
    CompanyId
);
typed_id!(
    /// Identifier of a marketer profile
    MarketerId
);
typed_id!(
    /// Identifier of a campaign category
    CategoryId
);
typed_id!(
    /// Identifier of a platform user account (payments, notifications, audit)
    UserId
);
typed_id!(
    /// Identifier of a platform administrator
    AdminId
);
