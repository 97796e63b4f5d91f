//! Withdrawal and payment method handlers

use affilink_domain::{AdminId, MarketerId, PaymentMethodId, WithdrawalId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::withdrawals::{
        AddPaymentMethodRequest, ApproveWithdrawalRequest, CompleteTransferRequest,
        CreateWithdrawalRequest, FailTransferRequest, PaymentMethodResponse,
        RejectWithdrawalRequest, WithdrawalResponse,
    },
    dto::ErrorResponse,
    error::ApiResult,
    AppState,
};

/// Request a payout; the amount is reserved against the balance at once
#[utoipa::path(
    post,
    path = "/withdrawals",
    request_body = CreateWithdrawalRequest,
    responses(
        (status = 201, description = "Withdrawal requested", body = WithdrawalResponse),
        (status = 400, description = "Amount below the minimum", body = ErrorResponse),
        (status = 404, description = "Unknown marketer or payment method", body = ErrorResponse),
        (status = 422, description = "Available balance does not cover the amount", body = ErrorResponse)
    ),
    tag = "withdrawals"
)]
pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(payload): Json<CreateWithdrawalRequest>,
) -> ApiResult<(StatusCode, Json<WithdrawalResponse>)> {
    info!(
        marketer_id = %payload.marketer_id,
        amount = %payload.amount,
        "Received withdrawal request"
    );

    let request = state
        .marketplace
        .withdrawals
        .create(
            MarketerId::from_uuid(payload.marketer_id),
            payload.amount,
            PaymentMethodId::from_uuid(payload.payment_method_id),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

#[utoipa::path(
    get,
    path = "/withdrawals/{id}",
    params(("id" = Uuid, Path, description = "Withdrawal id")),
    responses(
        (status = 200, description = "Withdrawal found", body = WithdrawalResponse),
        (status = 404, description = "Withdrawal not found", body = ErrorResponse)
    ),
    tag = "withdrawals"
)]
pub async fn get_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let request = state
        .marketplace
        .withdrawals
        .get(WithdrawalId::from_uuid(id))
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    get,
    path = "/marketers/{marketer_id}/withdrawals",
    params(("marketer_id" = Uuid, Path, description = "Marketer id")),
    responses(
        (status = 200, description = "Requests of the marketer, newest first", body = [WithdrawalResponse])
    ),
    tag = "withdrawals"
)]
pub async fn list_marketer_withdrawals(
    State(state): State<AppState>,
    Path(marketer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<WithdrawalResponse>>> {
    let requests = state
        .marketplace
        .withdrawals
        .list_for_marketer(MarketerId::from_uuid(marketer_id))
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/approve",
    params(("id" = Uuid, Path, description = "Withdrawal id")),
    request_body = ApproveWithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal approved", body = WithdrawalResponse),
        (status = 409, description = "Withdrawal is not pending", body = ErrorResponse),
        (status = 422, description = "Balance no longer covers the amount", body = ErrorResponse)
    ),
    tag = "withdrawals"
)]
pub async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveWithdrawalRequest>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let admin_id = payload.admin();
    let request = state
        .marketplace
        .withdrawals
        .approve(
            WithdrawalId::from_uuid(id),
            admin_id,
            payload.notes,
            payload.transaction_id,
        )
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/reject",
    params(("id" = Uuid, Path, description = "Withdrawal id")),
    request_body = RejectWithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal rejected", body = WithdrawalResponse),
        (status = 400, description = "Missing rejection reason", body = ErrorResponse),
        (status = 409, description = "Withdrawal is not pending", body = ErrorResponse)
    ),
    tag = "withdrawals"
)]
pub async fn reject_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectWithdrawalRequest>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let request = state
        .marketplace
        .withdrawals
        .reject(
            WithdrawalId::from_uuid(id),
            AdminId::from_uuid(payload.admin_id),
            &payload.reason,
            payload.notes,
        )
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/processing",
    params(("id" = Uuid, Path, description = "Withdrawal id")),
    responses(
        (status = 200, description = "Transfer started", body = WithdrawalResponse),
        (status = 409, description = "Withdrawal is not approved", body = ErrorResponse)
    ),
    tag = "withdrawals"
)]
pub async fn mark_withdrawal_processing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let request = state
        .marketplace
        .withdrawals
        .mark_processing(WithdrawalId::from_uuid(id))
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/complete",
    params(("id" = Uuid, Path, description = "Withdrawal id")),
    request_body = CompleteTransferRequest,
    responses(
        (status = 200, description = "Transfer settled", body = WithdrawalResponse),
        (status = 409, description = "Withdrawal is not approved or processing", body = ErrorResponse)
    ),
    tag = "withdrawals"
)]
pub async fn complete_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteTransferRequest>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let request = state
        .marketplace
        .withdrawals
        .complete_transfer(WithdrawalId::from_uuid(id), payload.transaction_id)
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/fail",
    params(("id" = Uuid, Path, description = "Withdrawal id")),
    request_body = FailTransferRequest,
    responses(
        (status = 200, description = "Transfer failed; the amount is available again", body = WithdrawalResponse),
        (status = 409, description = "Withdrawal is not approved or processing", body = ErrorResponse)
    ),
    tag = "withdrawals"
)]
pub async fn fail_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FailTransferRequest>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let request = state
        .marketplace
        .withdrawals
        .fail_transfer(WithdrawalId::from_uuid(id), &payload.reason)
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/marketers/{marketer_id}/payment-methods",
    params(("marketer_id" = Uuid, Path, description = "Marketer id")),
    request_body = AddPaymentMethodRequest,
    responses(
        (status = 201, description = "Payment method registered", body = PaymentMethodResponse),
        (status = 400, description = "Missing account details", body = ErrorResponse),
        (status = 404, description = "Marketer not found", body = ErrorResponse)
    ),
    tag = "payment-methods"
)]
pub async fn add_payment_method(
    State(state): State<AppState>,
    Path(marketer_id): Path<Uuid>,
    Json(payload): Json<AddPaymentMethodRequest>,
) -> ApiResult<(StatusCode, Json<PaymentMethodResponse>)> {
    let method = state
        .marketplace
        .payment_methods
        .add(MarketerId::from_uuid(marketer_id), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(method.into())))
}

#[utoipa::path(
    get,
    path = "/marketers/{marketer_id}/payment-methods",
    params(("marketer_id" = Uuid, Path, description = "Marketer id")),
    responses(
        (status = 200, description = "Payment methods of the marketer", body = [PaymentMethodResponse])
    ),
    tag = "payment-methods"
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Path(marketer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PaymentMethodResponse>>> {
    let methods = state
        .marketplace
        .payment_methods
        .list(MarketerId::from_uuid(marketer_id))
        .await?;
    Ok(Json(methods.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/marketers/{marketer_id}/payment-methods/{method_id}/default",
    params(
        ("marketer_id" = Uuid, Path, description = "Marketer id"),
        ("method_id" = Uuid, Path, description = "Payment method id")
    ),
    responses(
        (status = 200, description = "Method is now the default", body = PaymentMethodResponse),
        (status = 403, description = "Method belongs to another marketer", body = ErrorResponse),
        (status = 404, description = "Payment method not found", body = ErrorResponse)
    ),
    tag = "payment-methods"
)]
pub async fn set_default_payment_method(
    State(state): State<AppState>,
    Path((marketer_id, method_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<PaymentMethodResponse>> {
    let method = state
        .marketplace
        .payment_methods
        .set_default(
            MarketerId::from_uuid(marketer_id),
            PaymentMethodId::from_uuid(method_id),
        )
        .await?;
    Ok(Json(method.into()))
}

#[utoipa::path(
    delete,
    path = "/marketers/{marketer_id}/payment-methods/{method_id}",
    params(
        ("marketer_id" = Uuid, Path, description = "Marketer id"),
        ("method_id" = Uuid, Path, description = "Payment method id")
    ),
    responses(
        (status = 204, description = "Payment method deleted"),
        (status = 403, description = "Method belongs to another marketer", body = ErrorResponse),
        (status = 409, description = "Method is used by a withdrawal in progress", body = ErrorResponse)
    ),
    tag = "payment-methods"
)]
pub async fn delete_payment_method(
    State(state): State<AppState>,
    Path((marketer_id, method_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .marketplace
        .payment_methods
        .delete(
            MarketerId::from_uuid(marketer_id),
            PaymentMethodId::from_uuid(method_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
