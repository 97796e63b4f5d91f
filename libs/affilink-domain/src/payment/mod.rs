//! Payments: accrued commissions and withdrawal mirrors

mod entity;
mod service;

pub use entity::{Payment, PaymentStatus, PaymentType};
pub use service::PaymentService;
