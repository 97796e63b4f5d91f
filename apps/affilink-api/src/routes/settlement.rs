//! Payment, balance, withdrawal and payment method routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{payments, withdrawals},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/marketers/:marketer_id/balance",
            get(payments::marketer_balance),
        )
        .route("/payments/:id", get(payments::get_payment))
        .route(
            "/payments/:id/processing",
            post(payments::mark_payment_processing),
        )
        .route("/payments/:id/complete", post(payments::complete_payment))
        .route("/payments/:id/fail", post(payments::fail_payment))
        .route("/payments/:id/cancel", post(payments::cancel_payment))
        .route("/users/:user_id/payments", get(payments::list_user_payments))
        .route("/withdrawals", post(withdrawals::create_withdrawal))
        .route("/withdrawals/:id", get(withdrawals::get_withdrawal))
        .route(
            "/withdrawals/:id/approve",
            post(withdrawals::approve_withdrawal),
        )
        .route(
            "/withdrawals/:id/reject",
            post(withdrawals::reject_withdrawal),
        )
        .route(
            "/withdrawals/:id/processing",
            post(withdrawals::mark_withdrawal_processing),
        )
        .route(
            "/withdrawals/:id/complete",
            post(withdrawals::complete_withdrawal),
        )
        .route("/withdrawals/:id/fail", post(withdrawals::fail_withdrawal))
        .route(
            "/marketers/:marketer_id/withdrawals",
            get(withdrawals::list_marketer_withdrawals),
        )
        .route(
            "/marketers/:marketer_id/payment-methods",
            post(withdrawals::add_payment_method).get(withdrawals::list_payment_methods),
        )
        .route(
            "/marketers/:marketer_id/payment-methods/:method_id/default",
            post(withdrawals::set_default_payment_method),
        )
        .route(
            "/marketers/:marketer_id/payment-methods/:method_id",
            axum::routing::delete(withdrawals::delete_payment_method),
        )
}
