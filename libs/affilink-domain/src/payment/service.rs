//! Payment service
//!
//! Drives commission and other standalone payments. Withdrawal mirror rows
//! are owned by the withdrawal service and follow their request's status.

use tracing::{info, instrument};

use super::entity::{Payment, PaymentStatus, PaymentType};
use crate::context::ServiceContext;
use crate::error::{MarketplaceError, Result};
use crate::ids::{PaymentId, UserId};
use crate::ports::{
    Actor, AuditEntry, MarketplaceStore, NotificationKind, PaymentRepository, UnitOfWork,
};

pub struct PaymentService<S> {
    store: S,
    ctx: ServiceContext,
}

impl<S: MarketplaceStore> PaymentService<S> {
    pub fn new(store: S, ctx: ServiceContext) -> Self {
        Self { store, ctx }
    }

    pub async fn get(&self, id: PaymentId) -> Result<Payment> {
        let mut tx = self.store.begin().await?;
        tx.payment(id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Payment", id))
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Payment>> {
        let mut tx = self.store.begin().await?;
        tx.payments_for_user(user_id).await
    }

    /// `Pending → Processing`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the payment does not exist
    /// - `InvalidOperation` for a withdrawal payment or a payment that is not `Pending`
    pub async fn mark_processing(&self, id: PaymentId) -> Result<Payment> {
        self.advance(id, PaymentStatus::Processing, None).await
    }

    /// Settle a payment; a completed commission counts towards gross earnings
    ///
    /// # Arguments
    ///
    /// * `id` - The payment to settle
    /// * `transaction_id` - Optional reference of the executed transfer
    ///
    /// # Returns
    ///
    /// The payment in `Completed`, stamped with its completion time
    ///
    /// # Errors
    ///
    /// - `NotFound` if the payment does not exist
    /// - `InvalidOperation` for a withdrawal payment or a terminal payment
    pub async fn complete(&self, id: PaymentId, transaction_id: Option<String>) -> Result<Payment> {
        self.advance(id, PaymentStatus::Completed, transaction_id)
            .await
    }

    pub async fn fail(&self, id: PaymentId) -> Result<Payment> {
        self.advance(id, PaymentStatus::Failed, None).await
    }

    /// Only pending payments can be cancelled
    ///
    /// # Errors
    ///
    /// - `NotFound` if the payment does not exist
    /// - `InvalidOperation` once the payment has left `Pending`
    pub async fn cancel(&self, id: PaymentId) -> Result<Payment> {
        self.advance(id, PaymentStatus::Cancelled, None).await
    }

    #[instrument(skip(self, transaction_id), fields(payment_id = %id, to = %to))]
    async fn advance(
        &self,
        id: PaymentId,
        to: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Payment> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut payment = tx
            .payment(id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Payment", id))?;

        if payment.payment_type == PaymentType::Withdrawal {
            return Err(MarketplaceError::invalid_operation(
                "withdrawal payments follow their withdrawal request",
            ));
        }

        let previous = payment.advance(to, now)?;
        if transaction_id.is_some() {
            payment.transaction_id = transaction_id;
        }

        tx.update_payment(&payment).await?;
        tx.commit().await?;

        info!(from = %previous, amount = %payment.amount, "Payment status changed");
        self.ctx.audit(
            AuditEntry::new(Actor::System, "payment.status_changed", "Payment", id)
                .status_change(previous, payment.status),
        );
        if payment.status == PaymentStatus::Completed {
            self.ctx.notify(
                payment.user_id,
                NotificationKind::Payment,
                "Payment received",
                format!("A {} payment of {} was completed.", payment.payment_type, payment.amount),
                id,
            );
        }

        Ok(payment)
    }
}
