//! DTOs for payment and balance endpoints

use affilink_domain::payment::Payment;
use affilink_domain::MarketerBalance;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletePaymentRequest {
    /// Reference of the external transfer, when there is one
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Option<Uuid>,
    pub withdrawal_id: Option<Uuid>,
    pub amount: Decimal,
    #[schema(example = "commission")]
    pub payment_type: String,
    #[schema(example = "pending")]
    pub status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.into(),
            user_id: payment.user_id.into(),
            campaign_id: payment.campaign_id.map(Uuid::from),
            withdrawal_id: payment.withdrawal_id.map(Uuid::from),
            amount: payment.amount,
            payment_type: payment.payment_type.as_str().to_string(),
            status: payment.status.as_str().to_string(),
            transaction_id: payment.transaction_id,
            created_at: payment.created_at,
            completed_at: payment.completed_at,
        }
    }
}

/// Balance derived from completed commissions and withdrawal requests
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub marketer_id: Uuid,
    /// Sum of completed commission payments
    pub gross_earnings: Decimal,
    /// Sum of completed withdrawals
    pub withdrawn: Decimal,
    /// Sum of pending, approved and processing withdrawals
    pub pending_outflow: Decimal,
    pub available: Decimal,
}

impl From<MarketerBalance> for BalanceResponse {
    fn from(balance: MarketerBalance) -> Self {
        Self {
            marketer_id: balance.marketer_id.into(),
            gross_earnings: balance.gross_earnings,
            withdrawn: balance.withdrawn,
            pending_outflow: balance.pending_outflow,
            available: balance.available,
        }
    }
}
