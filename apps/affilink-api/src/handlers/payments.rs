//! Payment and balance handlers

use affilink_domain::{MarketerId, PaymentId, UserId};
use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    dto::payments::{BalanceResponse, CompletePaymentRequest, PaymentResponse},
    dto::ErrorResponse,
    error::ApiResult,
    AppState,
};

/// Derived balance of a marketer
#[utoipa::path(
    get,
    path = "/marketers/{marketer_id}/balance",
    params(("marketer_id" = Uuid, Path, description = "Marketer id")),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 404, description = "Marketer not found", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn marketer_balance(
    State(state): State<AppState>,
    Path(marketer_id): Path<Uuid>,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = state
        .marketplace
        .balances
        .marketer_balance(MarketerId::from_uuid(marketer_id))
        .await?;
    Ok(Json(balance.into()))
}

#[utoipa::path(
    get,
    path = "/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment found", body = PaymentResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let payment = state
        .marketplace
        .payments
        .get(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/payments",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Payments of the user", body = [PaymentResponse])
    ),
    tag = "payments"
)]
pub async fn list_user_payments(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PaymentResponse>>> {
    let payments = state
        .marketplace
        .payments
        .list_for_user(UserId::from_uuid(user_id))
        .await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/payments/{id}/processing",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment is processing", body = PaymentResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn mark_payment_processing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let payment = state
        .marketplace
        .payments
        .mark_processing(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    post,
    path = "/payments/{id}/complete",
    params(("id" = Uuid, Path, description = "Payment id")),
    request_body = CompletePaymentRequest,
    responses(
        (status = 200, description = "Payment completed", body = PaymentResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn complete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompletePaymentRequest>,
) -> ApiResult<Json<PaymentResponse>> {
    let payment = state
        .marketplace
        .payments
        .complete(PaymentId::from_uuid(id), payload.transaction_id)
        .await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    post,
    path = "/payments/{id}/fail",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment failed", body = PaymentResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn fail_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let payment = state
        .marketplace
        .payments
        .fail(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    post,
    path = "/payments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment cancelled", body = PaymentResponse),
        (status = 409, description = "Only pending payments can be cancelled", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn cancel_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let payment = state
        .marketplace
        .payments
        .cancel(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(payment.into()))
}
