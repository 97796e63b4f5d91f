//! Tracking links and their append-only performance log

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarketplaceError, Result};
use crate::ids::{CampaignId, MarketerId, PerformanceLogId, TrackingLinkId};

/// An attributable link issued to one marketer for one campaign
///
/// Counters only move through [`LinkDelta`] increments applied by the store,
/// never by writing back a value read earlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingLink {
    pub id: TrackingLinkId,
    pub campaign_id: CampaignId,
    pub marketer_id: MarketerId,
    /// Globally unique, URL-safe
    pub token: String,
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TrackingLink {
    /// A fresh link with zeroed counters
    pub fn new(
        campaign_id: CampaignId,
        marketer_id: MarketerId,
        token: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TrackingLinkId::new(),
            campaign_id,
            marketer_id,
            token,
            clicks: 0,
            conversions: 0,
            earnings: Decimal::ZERO,
            is_active: true,
            created_at: now,
        }
    }
}

/// Kind of performance event recorded against a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Impression,
    Click,
    Lead,
    Conversion,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Impression => "impression",
            EventType::Click => "click",
            EventType::Lead => "lead",
            EventType::Conversion => "conversion",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "impression" => Ok(EventType::Impression),
            "click" => Ok(EventType::Click),
            "lead" => Ok(EventType::Lead),
            "conversion" => Ok(EventType::Conversion),
            other => Err(MarketplaceError::integrity(format!(
                "unknown event type '{}'",
                other
            ))),
        }
    }
}

/// Counter increments produced by one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkDelta {
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: Decimal,
}

impl LinkDelta {
    /// Impressions and leads are logged but move no counter
    pub fn for_event(event: EventType, amount_earned: Decimal) -> Self {
        match event {
            EventType::Click => Self {
                clicks: 1,
                ..Self::default()
            },
            EventType::Conversion => Self {
                conversions: 1,
                earnings: amount_earned,
                ..Self::default()
            },
            EventType::Impression | EventType::Lead => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clicks == 0 && self.conversions == 0 && self.earnings.is_zero()
    }
}

/// One recorded event; never mutated after insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLog {
    pub id: PerformanceLogId,
    pub tracking_link_id: TrackingLinkId,
    pub event_type: EventType,
    pub amount_earned: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl PerformanceLog {
    pub fn new(
        tracking_link_id: TrackingLinkId,
        event_type: EventType,
        amount_earned: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PerformanceLogId::new(),
            tracking_link_id,
            event_type,
            amount_earned,
            recorded_at: now,
        }
    }
}
