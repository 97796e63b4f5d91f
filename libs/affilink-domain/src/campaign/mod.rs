//! Campaign lifecycle
//!
//! Companies create campaigns, administrators approve or reject them, and
//! owners pause, resume, complete, edit or delete them.

mod entity;
mod service;
mod status;

pub use entity::{Campaign, CampaignUpdate, CommissionType, NewCampaign};
pub(crate) use service::load_live_campaign;
pub use service::{CampaignService, DeleteOutcome};
pub use status::{CampaignStatus, CampaignTransition};
