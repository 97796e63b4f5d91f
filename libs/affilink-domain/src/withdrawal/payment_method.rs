//! Marketer payout methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarketplaceError, Result};
use crate::ids::{MarketerId, PaymentMethodId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    BankTransfer,
    PayPal,
    MobileWallet,
    Crypto,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::BankTransfer => "bank_transfer",
            PaymentMethodType::PayPal => "pay_pal",
            PaymentMethodType::MobileWallet => "mobile_wallet",
            PaymentMethodType::Crypto => "crypto",
        }
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethodType {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bank_transfer" => Ok(PaymentMethodType::BankTransfer),
            "pay_pal" => Ok(PaymentMethodType::PayPal),
            "mobile_wallet" => Ok(PaymentMethodType::MobileWallet),
            "crypto" => Ok(PaymentMethodType::Crypto),
            other => Err(MarketplaceError::integrity(format!(
                "unknown payment method type '{}'",
                other
            ))),
        }
    }
}

/// Where a marketer's withdrawals are paid to
///
/// At most one method per marketer carries `is_default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub marketer_id: MarketerId,
    pub method_type: PaymentMethodType,
    /// Opaque to this crate; interpreted by the transfer collaborator
    pub account_details: String,
    pub account_holder_name: String,
    pub is_default: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a payout method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentMethod {
    pub method_type: PaymentMethodType,
    pub account_details: String,
    pub account_holder_name: String,
    pub make_default: bool,
}

impl NewPaymentMethod {
    pub fn validate(&self) -> Result<()> {
        if self.account_details.trim().is_empty() {
            return Err(MarketplaceError::validation(
                "account details must not be empty",
            ));
        }
        if self.account_holder_name.trim().is_empty() {
            return Err(MarketplaceError::validation(
                "account holder name must not be empty",
            ));
        }
        Ok(())
    }
}

impl PaymentMethod {
    pub fn new(
        marketer_id: MarketerId,
        input: NewPaymentMethod,
        is_default: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentMethodId::new(),
            marketer_id,
            method_type: input.method_type,
            account_details: input.account_details,
            account_holder_name: input.account_holder_name.trim().to_string(),
            is_default,
            is_verified: false,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_holder_is_rejected() {
        let input = NewPaymentMethod {
            method_type: PaymentMethodType::BankTransfer,
            account_details: "FR76 3000 6000 0112 3456 7890 189".into(),
            account_holder_name: "   ".into(),
            make_default: false,
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_new_method_is_unverified() {
        let input = NewPaymentMethod {
            method_type: PaymentMethodType::PayPal,
            account_details: "payouts@example.com".into(),
            account_holder_name: " Ada Lovelace ".into(),
            make_default: true,
        };

        let method = PaymentMethod::new(MarketerId::new(), input, true, Utc::now());

        assert!(!method.is_verified);
        assert!(method.is_default);
        assert_eq!(method.account_holder_name, "Ada Lovelace");
    }

    #[test]
    fn test_type_string_roundtrip() {
        for t in [
            PaymentMethodType::BankTransfer,
            PaymentMethodType::PayPal,
            PaymentMethodType::MobileWallet,
            PaymentMethodType::Crypto,
        ] {
            assert_eq!(t.as_str().parse::<PaymentMethodType>().unwrap(), t);
        }
    }
}
