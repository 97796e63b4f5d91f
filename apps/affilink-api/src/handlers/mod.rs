//! HTTP handlers

pub mod applications;
pub mod campaigns;
pub mod payments;
pub mod tracking;
pub mod withdrawals;
