//! Withdrawal settlement and payout methods

mod entity;
mod methods;
mod payment_method;
mod service;

pub use entity::{WithdrawalRequest, WithdrawalStatus, WithdrawalTransition};
pub use methods::PaymentMethodService;
pub use payment_method::{NewPaymentMethod, PaymentMethod, PaymentMethodType};
pub use service::WithdrawalService;
