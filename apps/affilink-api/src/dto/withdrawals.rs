//! DTOs for withdrawal and payment method endpoints

use affilink_domain::withdrawal::{
    NewPaymentMethod, PaymentMethod, PaymentMethodType, WithdrawalRequest,
};
use affilink_domain::AdminId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWithdrawalRequest {
    pub marketer_id: Uuid,
    #[schema(example = "250.00")]
    pub amount: Decimal,
    pub payment_method_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveWithdrawalRequest {
    pub admin_id: Uuid,
    pub notes: Option<String>,
    pub transaction_id: Option<String>,
}

impl ApproveWithdrawalRequest {
    pub fn admin(&self) -> AdminId {
        AdminId::from_uuid(self.admin_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectWithdrawalRequest {
    pub admin_id: Uuid,
    #[schema(example = "Account holder does not match the marketer")]
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteTransferRequest {
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FailTransferRequest {
    #[schema(example = "Beneficiary bank rejected the transfer")]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalResponse {
    pub id: Uuid,
    pub marketer_id: Uuid,
    pub amount: Decimal,
    pub payment_method_id: Uuid,
    #[schema(example = "pending")]
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub failure_reason: Option<String>,
    pub admin_notes: Option<String>,
    pub transaction_id: Option<String>,
}

impl From<WithdrawalRequest> for WithdrawalResponse {
    fn from(request: WithdrawalRequest) -> Self {
        Self {
            id: request.id.into(),
            marketer_id: request.marketer_id.into(),
            amount: request.amount,
            payment_method_id: request.payment_method_id.into(),
            status: request.status.as_str().to_string(),
            requested_at: request.requested_at,
            processed_at: request.processed_at,
            processed_by: request.processed_by.map(Uuid::from),
            rejection_reason: request.rejection_reason,
            failure_reason: request.failure_reason,
            admin_notes: request.admin_notes,
            transaction_id: request.transaction_id,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPaymentMethodRequest {
    /// `bank_transfer`, `pay_pal`, `mobile_wallet` or `crypto`
    #[schema(value_type = String, example = "bank_transfer")]
    pub method_type: PaymentMethodType,
    #[schema(example = "DE89 3704 0044 0532 0130 00")]
    pub account_details: String,
    pub account_holder_name: String,
    #[serde(default)]
    pub make_default: bool,
}

impl From<AddPaymentMethodRequest> for NewPaymentMethod {
    fn from(request: AddPaymentMethodRequest) -> Self {
        Self {
            method_type: request.method_type,
            account_details: request.account_details,
            account_holder_name: request.account_holder_name,
            make_default: request.make_default,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentMethodResponse {
    pub id: Uuid,
    pub marketer_id: Uuid,
    #[schema(example = "bank_transfer")]
    pub method_type: String,
    /// Account details with all but the last four characters masked
    #[schema(example = "************3000")]
    pub account_details: String,
    pub account_holder_name: String,
    pub is_default: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentMethod> for PaymentMethodResponse {
    fn from(method: PaymentMethod) -> Self {
        Self {
            id: method.id.into(),
            marketer_id: method.marketer_id.into(),
            method_type: method.method_type.as_str().to_string(),
            account_details: mask(&method.account_details),
            account_holder_name: method.account_holder_name,
            is_default: method.is_default,
            is_verified: method.is_verified,
            created_at: method.created_at,
        }
    }
}

fn mask(details: &str) -> String {
    let chars: Vec<char> = details.chars().filter(|c| !c.is_whitespace()).collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    std::iter::repeat('*')
        .take(hidden)
        .chain(chars[hidden..].iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::mask;

    #[test]
    fn test_mask_keeps_last_four() {
        assert_eq!(mask("DE89 3704 0044 0532 0130 00"), "******************3000");
        assert_eq!(mask("abc"), "abc");
        assert_eq!(mask(""), "");
    }
}
