//! Tracking links, the performance log and attribution views

mod entity;
mod service;
mod stats;
mod token;

pub use entity::{EventType, LinkDelta, PerformanceLog, TrackingLink};
pub use service::TrackingService;
pub use stats::{
    conversion_rate, earnings_by_campaign, CampaignEarnings, CampaignPerformance, LinkStats,
};
pub use token::{HashTokenGenerator, MAX_TOKEN_LENGTH};
