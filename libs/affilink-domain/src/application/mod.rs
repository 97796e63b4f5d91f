//! Marketer applications to campaigns

mod entity;
mod service;

pub use entity::{ApplicationStatus, ApplicationTransition, CampaignApplication};
pub use service::{ApplicationService, ApprovedApplication};
