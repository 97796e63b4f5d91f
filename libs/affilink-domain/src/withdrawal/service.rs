//! Withdrawal settlement service
//!
//! Every balance-affecting operation takes the marketer lock before it
//! reads the derived balance, so two concurrent requests can never both
//! reserve the same funds. Approval writes a `Processing` mirror payment
//! which then follows the request through the transfer outcome.

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::entity::{WithdrawalRequest, WithdrawalStatus, WithdrawalTransition};
use crate::balance::current_balance;
use crate::context::ServiceContext;
use crate::config::ensure_money_scale;
use crate::error::{MarketplaceError, Result};
use crate::ids::{AdminId, MarketerId, PaymentMethodId, WithdrawalId};
use crate::payment::{Payment, PaymentStatus};
use crate::ports::{
    Actor, AuditEntry, Directory, MarketerProfile, MarketplaceStore, NotificationKind,
    PaymentMethodRepository, PaymentRepository, UnitOfWork, WithdrawalRepository,
};

async fn load_withdrawal<T: WithdrawalRepository>(
    tx: &mut T,
    id: WithdrawalId,
) -> Result<WithdrawalRequest> {
    tx.withdrawal(id)
        .await?
        .ok_or_else(|| MarketplaceError::not_found("WithdrawalRequest", id))
}

/// Service for the withdrawal settlement state machine
pub struct WithdrawalService<S, D> {
    store: S,
    directory: D,
    ctx: ServiceContext,
}

impl<S, D> WithdrawalService<S, D>
where
    S: MarketplaceStore,
    D: Directory,
{
    pub fn new(store: S, directory: D, ctx: ServiceContext) -> Self {
        Self {
            store,
            directory,
            ctx,
        }
    }

    async fn marketer(&self, id: MarketerId) -> Result<MarketerProfile> {
        self.directory
            .marketer(id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Marketer", id))
    }

    /// Request a payout of `amount` to one of the marketer's payment methods
    ///
    /// The amount is reserved immediately: it counts as pending outflow until
    /// the request is rejected, fails or completes.
    ///
    /// # Arguments
    ///
    /// * `marketer_id` - The requesting marketer
    /// * `amount` - Payout amount, in whole cents
    /// * `payment_method_id` - One of the marketer's own payment methods
    ///
    /// # Returns
    ///
    /// The new request in `Pending`
    ///
    /// # Errors
    ///
    /// - `Validation` if `amount` is below the configured minimum or finer than cents
    /// - `NotFound` if the marketer or the payment method (for this marketer) does not exist
    /// - `InsufficientFunds` if `amount` exceeds the available balance
    #[instrument(skip(self), fields(marketer_id = %marketer_id, amount = %amount))]
    pub async fn create(
        &self,
        marketer_id: MarketerId,
        amount: Decimal,
        payment_method_id: PaymentMethodId,
    ) -> Result<WithdrawalRequest> {
        let minimum = self.ctx.config.minimum_withdrawal;
        if amount < minimum || amount <= Decimal::ZERO {
            return Err(MarketplaceError::validation(format!(
                "withdrawal amount must be at least {}",
                minimum
            )));
        }
        ensure_money_scale("withdrawal amount", amount)?;

        let marketer = self.marketer(marketer_id).await?;
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        tx.payment_method(payment_method_id)
            .await?
            .filter(|method| method.marketer_id == marketer_id)
            .ok_or_else(|| MarketplaceError::not_found("PaymentMethod", payment_method_id))?;

        tx.lock_marketer(marketer_id).await?;
        let balance = current_balance(&mut tx, &marketer).await?;
        if !balance.covers(amount) {
            warn!(available = %balance.available, "Withdrawal exceeds available balance");
            return Err(MarketplaceError::insufficient_funds(
                amount,
                balance.available,
            ));
        }

        let request = WithdrawalRequest::new(marketer_id, amount, payment_method_id, now);
        tx.insert_withdrawal(&request).await?;
        tx.commit().await?;

        info!(withdrawal_id = %request.id, "Withdrawal requested");
        self.ctx.audit(AuditEntry::new(
            Actor::Marketer(marketer_id),
            "withdrawal.requested",
            "WithdrawalRequest",
            request.id,
        ));
        self.ctx.notify(
            marketer.user_id,
            NotificationKind::Withdrawal,
            "Withdrawal requested",
            format!("Your withdrawal of {} is awaiting review.", amount),
            request.id,
        );

        Ok(request)
    }

    /// Admin approval of a pending request
    ///
    /// The balance is re-checked under the marketer lock without this request's
    /// own reservation, and a `Processing` mirror payment is written.
    ///
    /// # Arguments
    ///
    /// * `id` - The request under review
    /// * `admin_id` - The approving admin
    /// * `notes` - Optional review notes
    /// * `transaction_id` - Reference of the external transfer, when already known
    ///
    /// # Returns
    ///
    /// The request in `Approved`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request or its marketer does not exist
    /// - `InvalidOperation` if the request is not `Pending`
    /// - `InsufficientFunds` if the balance no longer covers the amount
    #[instrument(skip(self, notes, transaction_id), fields(withdrawal_id = %id, admin_id = %admin_id))]
    pub async fn approve(
        &self,
        id: WithdrawalId,
        admin_id: AdminId,
        notes: Option<String>,
        transaction_id: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut request = load_withdrawal(&mut tx, id).await?;
        request.status.apply(WithdrawalTransition::Approve)?;

        let marketer = self.marketer(request.marketer_id).await?;
        tx.lock_marketer(request.marketer_id).await?;

        let balance = current_balance(&mut tx, &marketer)
            .await?
            .releasing(request.amount);
        if !balance.covers(request.amount) {
            warn!(available = %balance.available, "Balance no longer covers withdrawal");
            return Err(MarketplaceError::insufficient_funds(
                request.amount,
                balance.available,
            ));
        }

        let previous = request.transition(WithdrawalTransition::Approve)?;
        request.stamp_review(admin_id, notes, now);
        request.transaction_id = transaction_id.clone();
        tx.update_withdrawal(&request).await?;

        let mirror = Payment::withdrawal_mirror(
            marketer.user_id,
            request.id,
            request.amount,
            transaction_id,
            now,
        );
        tx.insert_payment(&mirror).await?;
        tx.commit().await?;

        info!(payment_id = %mirror.id, "Withdrawal approved");
        self.ctx.audit(
            AuditEntry::new(
                Actor::Admin(admin_id),
                "withdrawal.approved",
                "WithdrawalRequest",
                id,
            )
            .status_change(previous, request.status),
        );
        self.ctx.notify(
            marketer.user_id,
            NotificationKind::Withdrawal,
            "Withdrawal approved",
            format!("Your withdrawal of {} was approved.", request.amount),
            id,
        );

        Ok(request)
    }

    /// Admin rejection; the reserved amount returns to the available balance
    ///
    /// # Errors
    ///
    /// - `Validation` if `reason` is blank
    /// - `NotFound` if the request does not exist
    /// - `InvalidOperation` if the request is not `Pending`
    #[instrument(skip(self, reason, notes), fields(withdrawal_id = %id, admin_id = %admin_id))]
    pub async fn reject(
        &self,
        id: WithdrawalId,
        admin_id: AdminId,
        reason: &str,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MarketplaceError::validation(
                "a rejection reason is required",
            ));
        }

        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut request = load_withdrawal(&mut tx, id).await?;
        tx.lock_marketer(request.marketer_id).await?;

        let previous = request.transition(WithdrawalTransition::Reject)?;
        request.stamp_review(admin_id, notes, now);
        request.rejection_reason = Some(reason.to_string());

        tx.update_withdrawal(&request).await?;
        tx.commit().await?;

        info!("Withdrawal rejected");
        self.ctx.audit(
            AuditEntry::new(
                Actor::Admin(admin_id),
                "withdrawal.rejected",
                "WithdrawalRequest",
                id,
            )
            .status_change(previous, request.status),
        );
        self.notify_marketer(
            request.marketer_id,
            "Withdrawal rejected",
            format!("Your withdrawal of {} was rejected: {}", request.amount, reason),
            id,
        )
        .await;

        Ok(request)
    }

    /// The external transfer has started: `Approved → Processing`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `InvalidOperation` if the request is not `Approved`
    #[instrument(skip(self), fields(withdrawal_id = %id))]
    pub async fn mark_processing(&self, id: WithdrawalId) -> Result<WithdrawalRequest> {
        let mut tx = self.store.begin().await?;

        let mut request = load_withdrawal(&mut tx, id).await?;
        let previous = request.transition(WithdrawalTransition::StartTransfer)?;

        tx.update_withdrawal(&request).await?;
        tx.commit().await?;

        info!("Withdrawal transfer started");
        self.ctx.audit(
            AuditEntry::new(
                Actor::System,
                "withdrawal.processing",
                "WithdrawalRequest",
                id,
            )
            .status_change(previous, request.status),
        );

        Ok(request)
    }

    /// The external transfer succeeded; request and mirror payment complete
    ///
    /// # Arguments
    ///
    /// * `id` - The approved or processing request
    /// * `transaction_id` - Reference of the executed transfer
    ///
    /// # Returns
    ///
    /// The request in `Completed`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `InvalidOperation` if the request is not `Approved` or `Processing`
    #[instrument(skip(self, transaction_id), fields(withdrawal_id = %id))]
    pub async fn complete_transfer(
        &self,
        id: WithdrawalId,
        transaction_id: Option<String>,
    ) -> Result<WithdrawalRequest> {
        self.settle(id, WithdrawalTransition::Complete, transaction_id, None)
            .await
    }

    /// The external transfer failed; the amount returns to the available balance
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `InvalidOperation` if the request is not `Approved` or `Processing`
    #[instrument(skip(self, reason), fields(withdrawal_id = %id))]
    pub async fn fail_transfer(&self, id: WithdrawalId, reason: &str) -> Result<WithdrawalRequest> {
        let reason = reason.trim();
        let reason = (!reason.is_empty()).then(|| reason.to_string());
        self.settle(id, WithdrawalTransition::Fail, None, reason)
            .await
    }

    async fn settle(
        &self,
        id: WithdrawalId,
        transition: WithdrawalTransition,
        transaction_id: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let mut request = load_withdrawal(&mut tx, id).await?;
        tx.lock_marketer(request.marketer_id).await?;

        let previous = request.transition(transition)?;
        if transaction_id.is_some() {
            request.transaction_id = transaction_id;
        }
        request.failure_reason = failure_reason;

        let mut mirror = tx.payment_for_withdrawal(id).await?.ok_or_else(|| {
            MarketplaceError::integrity(format!(
                "withdrawal {} has no mirror payment",
                id
            ))
        })?;
        let payment_status = match request.status {
            WithdrawalStatus::Completed => PaymentStatus::Completed,
            _ => PaymentStatus::Failed,
        };
        mirror.advance(payment_status, now)?;
        if mirror.transaction_id.is_none() {
            mirror.transaction_id = request.transaction_id.clone();
        }

        tx.update_withdrawal(&request).await?;
        tx.update_payment(&mirror).await?;
        tx.commit().await?;

        info!(from = %previous, to = %request.status, "Withdrawal settled");
        self.ctx.audit(
            AuditEntry::new(
                Actor::System,
                "withdrawal.settled",
                "WithdrawalRequest",
                id,
            )
            .status_change(previous, request.status),
        );
        let (title, body) = match request.status {
            WithdrawalStatus::Completed => (
                "Withdrawal completed",
                format!("{} has been sent to your payment method.", request.amount),
            ),
            _ => (
                "Withdrawal failed",
                format!(
                    "The transfer of {} failed and the amount is available again.",
                    request.amount
                ),
            ),
        };
        self.notify_marketer(request.marketer_id, title, body, id)
            .await;

        Ok(request)
    }

    pub async fn get(&self, id: WithdrawalId) -> Result<WithdrawalRequest> {
        let mut tx = self.store.begin().await?;
        load_withdrawal(&mut tx, id).await
    }

    /// Requests of a marketer, newest first
    pub async fn list_for_marketer(&self, marketer_id: MarketerId) -> Result<Vec<WithdrawalRequest>> {
        let mut tx = self.store.begin().await?;
        tx.withdrawals_for_marketer(marketer_id).await
    }

    async fn notify_marketer(
        &self,
        marketer_id: MarketerId,
        title: &str,
        body: String,
        related: WithdrawalId,
    ) {
        match self.directory.marketer(marketer_id).await {
            Ok(Some(marketer)) => self.ctx.notify(
                marketer.user_id,
                NotificationKind::Withdrawal,
                title,
                body,
                related,
            ),
            Ok(None) => warn!(marketer_id = %marketer_id, "Marketer vanished, notification dropped"),
            Err(err) => warn!(error = %err, "Directory lookup failed, notification dropped"),
        }
    }
}
