//! Payment method service

use tracing::{info, instrument};

use super::payment_method::{NewPaymentMethod, PaymentMethod};
use crate::context::ServiceContext;
use crate::error::{MarketplaceError, Result};
use crate::ids::{MarketerId, PaymentMethodId};
use crate::ports::{
    Actor, AuditEntry, Directory, MarketplaceStore, PaymentMethodRepository, UnitOfWork,
};

async fn load_owned<T: PaymentMethodRepository>(
    tx: &mut T,
    id: PaymentMethodId,
    marketer_id: MarketerId,
) -> Result<PaymentMethod> {
    let method = tx
        .payment_method(id)
        .await?
        .ok_or_else(|| MarketplaceError::not_found("PaymentMethod", id))?;

    if method.marketer_id != marketer_id {
        return Err(MarketplaceError::forbidden(
            "payment method belongs to another marketer",
        ));
    }
    Ok(method)
}

/// Registers and maintains marketer payout methods
pub struct PaymentMethodService<S, D> {
    store: S,
    directory: D,
    ctx: ServiceContext,
}

impl<S, D> PaymentMethodService<S, D>
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

    /// Register a method; the marketer's first method becomes the default
    ///
    /// # Arguments
    ///
    /// * `marketer_id` - Owner of the method
    /// * `input` - Method type, account details, holder name and default flag
    ///
    /// # Returns
    ///
    /// The stored method, unverified
    ///
    /// # Errors
    ///
    /// - `Validation` if the account details or holder are blank
    /// - `NotFound` if the marketer does not exist
    #[instrument(skip(self, input), fields(marketer_id = %marketer_id))]
    pub async fn add(&self, marketer_id: MarketerId, input: NewPaymentMethod) -> Result<PaymentMethod> {
        input.validate()?;
        self.directory
            .marketer(marketer_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Marketer", marketer_id))?;

        let now = self.ctx.now();
        let mut tx = self.store.begin().await?;

        let existing = tx.payment_methods_for_marketer(marketer_id).await?;
        let is_default = input.make_default || existing.is_empty();
        if is_default {
            tx.clear_default_payment_method(marketer_id).await?;
        }

        let method = PaymentMethod::new(marketer_id, input, is_default, now);
        tx.insert_payment_method(&method).await?;
        tx.commit().await?;

        info!(payment_method_id = %method.id, is_default, "Payment method added");
        self.ctx.audit(AuditEntry::new(
            Actor::Marketer(marketer_id),
            "payment_method.added",
            "PaymentMethod",
            method.id,
        ));

        Ok(method)
    }

    /// Make `id` the marketer's only default method
    ///
    /// # Errors
    ///
    /// - `NotFound` if the method does not exist
    /// - `Forbidden` if the method belongs to another marketer
    #[instrument(skip(self), fields(marketer_id = %marketer_id, payment_method_id = %id))]
    pub async fn set_default(&self, marketer_id: MarketerId, id: PaymentMethodId) -> Result<PaymentMethod> {
        let mut tx = self.store.begin().await?;

        let mut method = load_owned(&mut tx, id, marketer_id).await?;
        if method.is_default {
            return Ok(method);
        }

        tx.clear_default_payment_method(marketer_id).await?;
        method.is_default = true;
        tx.update_payment_method(&method).await?;
        tx.commit().await?;

        info!("Default payment method changed");
        self.ctx.audit(AuditEntry::new(
            Actor::Marketer(marketer_id),
            "payment_method.default_set",
            "PaymentMethod",
            id,
        ));

        Ok(method)
    }

    /// Remove a method that no in-flight withdrawal points at
    ///
    /// # Errors
    ///
    /// - `NotFound` if the method does not exist
    /// - `Forbidden` if the method belongs to another marketer
    /// - `InvalidOperation` while a pending, approved or processing withdrawal uses it
    #[instrument(skip(self), fields(marketer_id = %marketer_id, payment_method_id = %id))]
    pub async fn delete(&self, marketer_id: MarketerId, id: PaymentMethodId) -> Result<()> {
        let mut tx = self.store.begin().await?;

        load_owned(&mut tx, id, marketer_id).await?;
        if tx.payment_method_in_use(id).await? {
            return Err(MarketplaceError::invalid_operation(
                "payment method is used by a withdrawal in progress",
            ));
        }

        tx.delete_payment_method(id).await?;
        tx.commit().await?;

        info!("Payment method deleted");
        self.ctx.audit(AuditEntry::new(
            Actor::Marketer(marketer_id),
            "payment_method.deleted",
            "PaymentMethod",
            id,
        ));

        Ok(())
    }

    pub async fn list(&self, marketer_id: MarketerId) -> Result<Vec<PaymentMethod>> {
        let mut tx = self.store.begin().await?;
        tx.payment_methods_for_marketer(marketer_id).await
    }
}
