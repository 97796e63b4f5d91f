//! Balance calculator
//!
//! A marketer's balance is never stored. It is derived on every read from
//! completed commission payments and withdrawal requests:
//!
//! ```text
//! gross     = Σ completed commission payments of the marketer's user
//! withdrawn = Σ completed withdrawal requests
//! pending   = Σ pending | approved | processing withdrawal requests
//! available = gross − withdrawn − pending
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::error::{MarketplaceError, Result};
use crate::ids::MarketerId;
use crate::ports::{Directory, MarketerProfile, MarketplaceStore, PaymentRepository, WithdrawalRepository};
use crate::payment::{Payment, PaymentStatus, PaymentType};
use crate::withdrawal::{WithdrawalRequest, WithdrawalStatus};

/// Sums of a marketer's withdrawal requests, split by settlement stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WithdrawalTotals {
    pub completed: Decimal,
    pub in_flight: Decimal,
}

impl WithdrawalTotals {
    /// Fold withdrawal requests into totals
    pub fn accumulate<'a>(requests: impl IntoIterator<Item = &'a WithdrawalRequest>) -> Self {
        requests
            .into_iter()
            .fold(Self::default(), |mut totals, request| {
                if request.status == WithdrawalStatus::Completed {
                    totals.completed += request.amount;
                } else if request.status.is_in_flight() {
                    totals.in_flight += request.amount;
                }
                totals
            })
    }
}

/// Sum of completed commission payments among `payments`
pub fn completed_commissions<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Decimal {
    payments
        .into_iter()
        .filter(|p| {
            p.payment_type == PaymentType::Commission && p.status == PaymentStatus::Completed
        })
        .map(|p| p.amount)
        .sum()
}

/// A marketer's derived balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketerBalance {
    pub marketer_id: MarketerId,
    pub gross_earnings: Decimal,
    pub withdrawn: Decimal,
    pub pending_outflow: Decimal,
    pub available: Decimal,
}

impl MarketerBalance {
    /// Derive the balance from persisted sums
    ///
    /// A negative available balance means the persisted history is corrupt;
    /// it is reported as `Integrity`, never clamped to zero.
    pub fn derive(
        marketer_id: MarketerId,
        gross_earnings: Decimal,
        withdrawals: WithdrawalTotals,
    ) -> Result<Self> {
        let available = gross_earnings - withdrawals.completed - withdrawals.in_flight;

        if available < Decimal::ZERO {
            error!(
                marketer_id = %marketer_id,
                gross = %gross_earnings,
                withdrawn = %withdrawals.completed,
                pending = %withdrawals.in_flight,
                "Derived available balance is negative"
            );
            return Err(MarketplaceError::integrity(format!(
                "available balance of marketer {} is negative",
                marketer_id
            )));
        }

        Ok(Self {
            marketer_id,
            gross_earnings,
            withdrawn: withdrawals.completed,
            pending_outflow: withdrawals.in_flight,
            available,
        })
    }

    /// Balance as it would be without one in-flight reservation
    ///
    /// Used when re-validating a request that is itself part of `pending_outflow`.
    pub fn releasing(&self, amount: Decimal) -> Self {
        Self {
            pending_outflow: self.pending_outflow - amount,
            available: self.available + amount,
            ..*self
        }
    }

    pub fn covers(&self, amount: Decimal) -> bool {
        amount <= self.available
    }
}

/// Derive the balance inside an open unit of work
///
/// Callers that act on the result must hold
/// [`WithdrawalRepository::lock_marketer`] for the same marketer.
pub(crate) async fn current_balance<T>(tx: &mut T, marketer: &MarketerProfile) -> Result<MarketerBalance>
where
    T: PaymentRepository + WithdrawalRepository,
{
    let gross = tx.completed_commission_total(marketer.user_id).await?;
    let totals = tx.withdrawal_totals(marketer.id).await?;
    MarketerBalance::derive(marketer.id, gross, totals)
}

/// Read-only service exposing derived balances
pub struct BalanceService<S, D> {
    store: S,
    directory: D,
}

impl<S, D> BalanceService<S, D>
where
    S: MarketplaceStore,
    D: Directory,
{
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }

    /// # Errors
    ///
    /// - `NotFound` if the marketer does not exist
    /// - `Integrity` if the persisted history yields a negative balance
    #[instrument(skip(self), fields(marketer_id = %marketer_id))]
    pub async fn marketer_balance(&self, marketer_id: MarketerId) -> Result<MarketerBalance> {
        let marketer = self
            .directory
            .marketer(marketer_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Marketer", marketer_id))?;

        let mut tx = self.store.begin().await?;
        current_balance(&mut tx, &marketer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CampaignId, PaymentMethodId, UserId};
    use crate::withdrawal::WithdrawalTransition;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn withdrawal(amount: Decimal, status: WithdrawalStatus) -> WithdrawalRequest {
        let mut request =
            WithdrawalRequest::new(MarketerId::new(), amount, PaymentMethodId::new(), Utc::now());
        request.status = status;
        request
    }

    #[test]
    fn test_scenario_gross_500_withdrawn_200_pending_50() {
        let requests = vec![
            withdrawal(dec!(200), WithdrawalStatus::Completed),
            withdrawal(dec!(50), WithdrawalStatus::Pending),
            withdrawal(dec!(75), WithdrawalStatus::Rejected),
            withdrawal(dec!(30), WithdrawalStatus::Failed),
        ];
        let totals = WithdrawalTotals::accumulate(&requests);

        let balance = MarketerBalance::derive(MarketerId::new(), dec!(500), totals).unwrap();

        assert_eq!(balance.withdrawn, dec!(200));
        assert_eq!(balance.pending_outflow, dec!(50));
        assert_eq!(balance.available, dec!(250));
        assert!(!balance.covers(dec!(300)));
        assert!(balance.covers(dec!(250)));
    }

    #[test]
    fn test_approved_and_processing_are_reserved() {
        let requests = vec![
            withdrawal(dec!(10), WithdrawalStatus::Approved),
            withdrawal(dec!(20), WithdrawalStatus::Processing),
        ];

        let totals = WithdrawalTotals::accumulate(&requests);

        assert_eq!(totals.in_flight, dec!(30));
        assert_eq!(totals.completed, Decimal::ZERO);
    }

    #[test]
    fn test_negative_balance_is_an_integrity_error() {
        let totals = WithdrawalTotals {
            completed: dec!(80),
            in_flight: dec!(40),
        };

        let err = MarketerBalance::derive(MarketerId::new(), dec!(100), totals).unwrap_err();

        assert!(matches!(err, MarketplaceError::Integrity(_)));
    }

    #[test]
    fn test_releasing_own_reservation() {
        let totals = WithdrawalTotals {
            completed: Decimal::ZERO,
            in_flight: dec!(100),
        };
        let balance = MarketerBalance::derive(MarketerId::new(), dec!(100), totals).unwrap();

        assert_eq!(balance.available, Decimal::ZERO);
        assert!(balance.releasing(dec!(100)).covers(dec!(100)));
    }

    #[test]
    fn test_only_completed_commissions_count() {
        let user = UserId::new();
        let campaign = CampaignId::new();
        let now = Utc::now();

        let mut completed = Payment::commission(user, campaign, dec!(40), now);
        completed.advance(PaymentStatus::Completed, now).unwrap();
        let pending = Payment::commission(user, campaign, dec!(15), now);
        let mut mirror =
            Payment::withdrawal_mirror(user, crate::ids::WithdrawalId::new(), dec!(5), None, now);
        mirror.advance(PaymentStatus::Completed, now).unwrap();

        assert_eq!(completed_commissions(&[completed, pending, mirror]), dec!(40));
    }

    #[test]
    fn test_rejection_returns_amount_to_available() {
        let mut request = withdrawal(dec!(250), WithdrawalStatus::Pending);
        let completed = withdrawal(dec!(200), WithdrawalStatus::Completed);

        let before = WithdrawalTotals::accumulate([&request, &completed]);
        request.transition(WithdrawalTransition::Reject).unwrap();
        let after = WithdrawalTotals::accumulate([&request, &completed]);

        let marketer = MarketerId::new();
        assert_eq!(
            MarketerBalance::derive(marketer, dec!(500), before).unwrap().available,
            dec!(50)
        );
        assert_eq!(
            MarketerBalance::derive(marketer, dec!(500), after).unwrap().available,
            dec!(300)
        );
    }
}
