//! Integration tests for withdrawal settlement and derived balances
//!
//! These tests verify that:
//! 1. Two concurrent withdrawals can never spend the same balance
//! 2. Pending, approved and processing requests reserve their amount
//! 3. Rejected and failed requests give their amount back
//! 4. Approval writes a mirror payment that follows the transfer outcome
//! 5. Payment methods are scoped to their marketer

mod common;

use affilink_domain::payment::{PaymentStatus, PaymentType};
use affilink_domain::ports::NotificationKind;
use affilink_domain::withdrawal::{NewPaymentMethod, PaymentMethodType, WithdrawalStatus};
use affilink_domain::{AdminId, ErrorKind, MarketplaceError, PaymentMethodId};
use common::Harness;
use rust_decimal_macros::dec;

/// Two concurrent requests of 80 against a balance of 100: exactly one wins
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_cannot_double_spend() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;
    let (marketer_id, method_id) = (marketer.id, method.id);

    let first = {
        let marketplace = harness.marketplace.clone();
        tokio::spawn(async move {
            marketplace
                .withdrawals
                .create(marketer_id, dec!(80), method_id)
                .await
        })
    };
    let second = {
        let marketplace = harness.marketplace.clone();
        tokio::spawn(async move {
            marketplace
                .withdrawals
                .create(marketer_id, dec!(80), method_id)
                .await
        })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    let refusals: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().err()).collect();

    assert_eq!(successes, 1, "exactly one withdrawal must be accepted");
    assert_eq!(refusals.len(), 1);
    assert_eq!(
        refusals[0],
        &MarketplaceError::InsufficientFunds {
            requested: dec!(80),
            available: dec!(20),
        }
    );

    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.pending_outflow, dec!(80));
    assert_eq!(balance.available, dec!(20));
}

/// Many small requests racing for the same funds never overdraw
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_request_burst_never_exceeds_balance() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;
    let (marketer_id, method_id) = (marketer.id, method.id);

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let marketplace = harness.marketplace.clone();
            tokio::spawn(async move {
                marketplace
                    .withdrawals
                    .create(marketer_id, dec!(15), method_id)
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::InsufficientFunds),
        }
    }

    assert_eq!(accepted, 6);
    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.available, dec!(10));
}

/// Settle a withdrawal end to end so it counts as withdrawn
async fn withdraw_completely(
    harness: &Harness,
    marketer: affilink_domain::MarketerId,
    method: PaymentMethodId,
    amount: rust_decimal::Decimal,
) {
    let withdrawals = &harness.marketplace.withdrawals;
    let request = withdrawals.create(marketer, amount, method).await.unwrap();
    withdrawals
        .approve(request.id, AdminId::new(), None, None)
        .await
        .unwrap();
    withdrawals.mark_processing(request.id).await.unwrap();
    withdrawals
        .complete_transfer(request.id, Some("wire-001".to_string()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_balance_with_withdrawn_and_pending_amounts() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(500)).await;
    let withdrawals = &harness.marketplace.withdrawals;

    withdraw_completely(&harness, marketer.id, method.id, dec!(200)).await;
    withdrawals
        .create(marketer.id, dec!(50), method.id)
        .await
        .unwrap();

    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.gross_earnings, dec!(500));
    assert_eq!(balance.withdrawn, dec!(200));
    assert_eq!(balance.pending_outflow, dec!(50));
    assert_eq!(balance.available, dec!(250));

    let err = withdrawals
        .create(marketer.id, dec!(300), method.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    let accepted = withdrawals
        .create(marketer.id, dec!(250), method.id)
        .await
        .unwrap();
    assert_eq!(accepted.status, WithdrawalStatus::Pending);
}

#[tokio::test]
async fn test_rejection_returns_amount_to_available_balance() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(500)).await;
    let withdrawals = &harness.marketplace.withdrawals;

    withdraw_completely(&harness, marketer.id, method.id, dec!(200)).await;
    let request = withdrawals
        .create(marketer.id, dec!(250), method.id)
        .await
        .unwrap();

    let admin = AdminId::new();
    let rejected = withdrawals
        .reject(request.id, admin, "bank details invalid", None)
        .await
        .unwrap();

    assert_eq!(rejected.status, WithdrawalStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("bank details invalid"));
    assert_eq!(rejected.processed_by, Some(admin));
    assert!(rejected.processed_at.is_some());

    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.available, dec!(300));
}

#[tokio::test]
async fn test_rejection_requires_a_reason() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;
    let request = harness
        .marketplace
        .withdrawals
        .create(marketer.id, dec!(40), method.id)
        .await
        .unwrap();

    let err = harness
        .marketplace
        .withdrawals
        .reject(request.id, AdminId::new(), "  ", None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let unchanged = harness.marketplace.withdrawals.get(request.id).await.unwrap();
    assert_eq!(unchanged.status, WithdrawalStatus::Pending);
}

#[tokio::test]
async fn test_approval_writes_processing_mirror_payment() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;
    let withdrawals = &harness.marketplace.withdrawals;

    let request = withdrawals
        .create(marketer.id, dec!(100), method.id)
        .await
        .unwrap();
    let admin = AdminId::new();
    let approved = withdrawals
        .approve(
            request.id,
            admin,
            Some("verified by phone".to_string()),
            Some("tx-42".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(approved.status, WithdrawalStatus::Approved);
    assert_eq!(approved.processed_by, Some(admin));
    assert_eq!(approved.admin_notes.as_deref(), Some("verified by phone"));
    assert_eq!(approved.transaction_id.as_deref(), Some("tx-42"));

    let mirror = harness
        .marketplace
        .payments
        .list_for_user(marketer.user_id)
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.withdrawal_id == Some(request.id))
        .unwrap();
    assert_eq!(mirror.payment_type, PaymentType::Withdrawal);
    assert_eq!(mirror.status, PaymentStatus::Processing);
    assert_eq!(mirror.amount, dec!(100));

    // The reservation is still held while the transfer runs
    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.available, dec!(0));
}

#[tokio::test]
async fn test_completed_transfer_moves_amount_to_withdrawn() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(120)).await;

    withdraw_completely(&harness, marketer.id, method.id, dec!(70)).await;

    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.withdrawn, dec!(70));
    assert_eq!(balance.pending_outflow, dec!(0));
    assert_eq!(balance.available, dec!(50));

    let payments = harness
        .marketplace
        .payments
        .list_for_user(marketer.user_id)
        .await
        .unwrap();
    let mirror = payments
        .iter()
        .find(|p| p.payment_type == PaymentType::Withdrawal)
        .unwrap();
    assert_eq!(mirror.status, PaymentStatus::Completed);
    assert_eq!(mirror.transaction_id.as_deref(), Some("wire-001"));
    assert!(mirror.completed_at.is_some());
}

#[tokio::test]
async fn test_failed_transfer_releases_reservation() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(90)).await;
    let withdrawals = &harness.marketplace.withdrawals;

    let request = withdrawals
        .create(marketer.id, dec!(90), method.id)
        .await
        .unwrap();
    withdrawals
        .approve(request.id, AdminId::new(), None, None)
        .await
        .unwrap();
    let failed = withdrawals
        .fail_transfer(request.id, "account closed")
        .await
        .unwrap();

    assert_eq!(failed.status, WithdrawalStatus::Failed);
    assert_eq!(failed.failure_reason.as_deref(), Some("account closed"));

    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.available, dec!(90));

    let mirror = harness
        .marketplace
        .payments
        .list_for_user(marketer.user_id)
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.withdrawal_id == Some(request.id))
        .unwrap();
    assert_eq!(mirror.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn test_illegal_withdrawal_transitions_leave_request_unchanged() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;
    let withdrawals = &harness.marketplace.withdrawals;

    let request = withdrawals
        .create(marketer.id, dec!(30), method.id)
        .await
        .unwrap();

    let err = withdrawals.mark_processing(request.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    let err = withdrawals
        .complete_transfer(request.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    withdrawals
        .reject(request.id, AdminId::new(), "duplicate request", None)
        .await
        .unwrap();
    let err = withdrawals
        .approve(request.id, AdminId::new(), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let current = withdrawals.get(request.id).await.unwrap();
    assert_eq!(current.status, WithdrawalStatus::Rejected);
}

#[tokio::test]
async fn test_minimum_withdrawal_amount() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;

    let err = harness
        .marketplace
        .withdrawals
        .create(marketer.id, dec!(9.99), method.id)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(harness
        .marketplace
        .withdrawals
        .list_for_marketer(marketer.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_withdrawal_amount_is_whole_cents() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;
    let withdrawals = &harness.marketplace.withdrawals;

    let err = withdrawals
        .create(marketer.id, dec!(10.004), method.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let request = withdrawals
        .create(marketer.id, dec!(10.50), method.id)
        .await
        .unwrap();
    assert_eq!(request.amount, dec!(10.50));
    assert_eq!(withdrawals.list_for_marketer(marketer.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_foreign_payment_method_is_not_found() {
    let harness = Harness::new();
    let (marketer, _) = harness.funded_marketer(dec!(100)).await;
    let (_, foreign_method) = harness.funded_marketer(dec!(0)).await;

    let err = harness
        .marketplace
        .withdrawals
        .create(marketer.id, dec!(50), foreign_method.id)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unknown_marketer_is_not_found() {
    let harness = Harness::new();

    let err = harness
        .marketplace
        .balances
        .marketer_balance(affilink_domain::MarketerId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, MarketplaceError::NotFound { entity: "Marketer", .. }));
}

#[tokio::test]
async fn test_pending_commissions_do_not_count() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (marketer, link) = harness.promoter(&company, &campaign).await;

    harness
        .marketplace
        .tracking
        .record_event(
            link.id,
            affilink_domain::tracking::EventType::Conversion,
            dec!(60),
        )
        .await
        .unwrap();

    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.gross_earnings, dec!(0));
    assert_eq!(balance.available, dec!(0));
}

#[tokio::test]
async fn test_withdrawal_notifications_reach_marketer() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;

    let request = harness
        .marketplace
        .withdrawals
        .create(marketer.id, dec!(25), method.id)
        .await
        .unwrap();
    harness
        .marketplace
        .withdrawals
        .reject(request.id, AdminId::new(), "bank details invalid", None)
        .await
        .unwrap();

    let titles: Vec<_> = harness
        .notifier
        .sent()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::Withdrawal && n.user_id == marketer.user_id)
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["Withdrawal requested", "Withdrawal rejected"]);
    assert!(harness.audit.actions().contains(&"withdrawal.rejected"));
}

#[tokio::test]
async fn test_first_payment_method_becomes_default() {
    let harness = Harness::new();
    let marketer = harness.directory.add_marketer().await;
    let methods = &harness.marketplace.payment_methods;

    let first = harness.payment_method(&marketer).await;
    let second = harness.payment_method(&marketer).await;
    assert!(first.is_default);
    assert!(!second.is_default);

    methods.set_default(marketer.id, second.id).await.unwrap();

    let listed = methods.list(marketer.id).await.unwrap();
    let defaults: Vec<_> = listed.iter().filter(|m| m.is_default).map(|m| m.id).collect();
    assert_eq!(defaults, vec![second.id]);
}

#[tokio::test]
async fn test_payment_method_in_use_cannot_be_deleted() {
    let harness = Harness::new();
    let (marketer, method) = harness.funded_marketer(dec!(100)).await;
    let methods = &harness.marketplace.payment_methods;

    let request = harness
        .marketplace
        .withdrawals
        .create(marketer.id, dec!(20), method.id)
        .await
        .unwrap();

    let err = methods.delete(marketer.id, method.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    harness
        .marketplace
        .withdrawals
        .reject(request.id, AdminId::new(), "changed my mind", None)
        .await
        .unwrap();
    methods.delete(marketer.id, method.id).await.unwrap();
    assert!(methods.list(marketer.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_method_of_another_marketer_is_forbidden() {
    let harness = Harness::new();
    let owner = harness.directory.add_marketer().await;
    let intruder = harness.directory.add_marketer().await;
    let method = harness.payment_method(&owner).await;

    let err = harness
        .marketplace
        .payment_methods
        .set_default(intruder.id, method.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = harness
        .marketplace
        .payment_methods
        .add(
            intruder.id,
            NewPaymentMethod {
                method_type: PaymentMethodType::PayPal,
                account_details: String::new(),
                account_holder_name: "Intruder".to_string(),
                make_default: true,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_commission_payment_lifecycle() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (marketer, link) = harness.promoter(&company, &campaign).await;

    for _ in 0..2 {
        harness
            .marketplace
            .tracking
            .record_event(
                link.id,
                affilink_domain::tracking::EventType::Conversion,
                dec!(40),
            )
            .await
            .unwrap();
    }
    let commissions = harness
        .marketplace
        .payments
        .list_for_user(marketer.user_id)
        .await
        .unwrap();
    assert_eq!(commissions.len(), 2);
    assert!(commissions
        .iter()
        .all(|p| p.payment_type == PaymentType::Commission && p.status == PaymentStatus::Pending));

    let payments = &harness.marketplace.payments;
    let processing = payments.mark_processing(commissions[0].id).await.unwrap();
    assert_eq!(processing.status, PaymentStatus::Processing);

    let err = payments.cancel(processing.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let failed = payments.fail(processing.id).await.unwrap();
    assert_eq!(failed.status, PaymentStatus::Failed);
    assert!(failed.completed_at.is_none());

    let cancelled = payments.cancel(commissions[1].id).await.unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);

    let balance = harness
        .marketplace
        .balances
        .marketer_balance(marketer.id)
        .await
        .unwrap();
    assert_eq!(balance.gross_earnings, dec!(0));
}
