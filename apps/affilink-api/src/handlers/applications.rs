//! Application handlers

use affilink_domain::{ApplicationId, CampaignId, CompanyId, MarketerId};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::applications::{
        ApplicationResponse, ApplyRequest, ApproveApplicationRequest,
        ApprovedApplicationResponse, MarketerActionRequest, RejectApplicationRequest,
    },
    dto::campaigns::CompanyQuery,
    dto::ErrorResponse,
    error::ApiResult,
    AppState,
};

/// Apply to an active campaign
#[utoipa::path(
    post,
    path = "/campaigns/{id}/applications",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 404, description = "Unknown campaign or marketer", body = ErrorResponse),
        (status = 409, description = "Campaign not open, or already applied", body = ErrorResponse)
    ),
    tag = "applications"
)]
pub async fn apply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplyRequest>,
) -> ApiResult<(StatusCode, Json<ApplicationResponse>)> {
    info!(campaign_id = %id, marketer_id = %payload.marketer_id, "Received application");

    let application = state
        .marketplace
        .applications
        .apply(
            CampaignId::from_uuid(id),
            MarketerId::from_uuid(payload.marketer_id),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(application.into())))
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}/applications",
    params(("id" = Uuid, Path, description = "Campaign id"), CompanyQuery),
    responses(
        (status = 200, description = "Applications to the campaign", body = [ApplicationResponse]),
        (status = 403, description = "Not the campaign owner", body = ErrorResponse)
    ),
    tag = "applications"
)]
pub async fn list_campaign_applications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<Json<Vec<ApplicationResponse>>> {
    let applications = state
        .marketplace
        .applications
        .list_for_campaign(CampaignId::from_uuid(id), query.company())
        .await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/marketers/{marketer_id}/applications",
    params(("marketer_id" = Uuid, Path, description = "Marketer id")),
    responses(
        (status = 200, description = "Applications of the marketer", body = [ApplicationResponse])
    ),
    tag = "applications"
)]
pub async fn list_marketer_applications(
    State(state): State<AppState>,
    Path(marketer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ApplicationResponse>>> {
    let applications = state
        .marketplace
        .applications
        .list_for_marketer(MarketerId::from_uuid(marketer_id))
        .await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application found", body = ApplicationResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    tag = "applications"
)]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApplicationResponse>> {
    let application = state
        .marketplace
        .applications
        .get(ApplicationId::from_uuid(id))
        .await?;
    Ok(Json(application.into()))
}

/// Accept an application and issue the marketer's tracking link
#[utoipa::path(
    post,
    path = "/applications/{id}/approve",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ApproveApplicationRequest,
    responses(
        (status = 200, description = "Application accepted", body = ApprovedApplicationResponse),
        (status = 403, description = "Not the campaign owner", body = ErrorResponse),
        (status = 409, description = "Application already decided", body = ErrorResponse)
    ),
    tag = "applications"
)]
pub async fn approve_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveApplicationRequest>,
) -> ApiResult<Json<ApprovedApplicationResponse>> {
    let company_id = payload.company();
    let approved = state
        .marketplace
        .applications
        .approve(ApplicationId::from_uuid(id), company_id, payload.note)
        .await?;
    Ok(Json(approved.into()))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/reject",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = RejectApplicationRequest,
    responses(
        (status = 200, description = "Application rejected", body = ApplicationResponse),
        (status = 400, description = "Missing rejection note", body = ErrorResponse),
        (status = 403, description = "Not the campaign owner", body = ErrorResponse),
        (status = 409, description = "Application already decided", body = ErrorResponse)
    ),
    tag = "applications"
)]
pub async fn reject_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectApplicationRequest>,
) -> ApiResult<Json<ApplicationResponse>> {
    let application = state
        .marketplace
        .applications
        .reject(
            ApplicationId::from_uuid(id),
            CompanyId::from_uuid(payload.company_id),
            &payload.note,
        )
        .await?;
    Ok(Json(application.into()))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/withdraw",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = MarketerActionRequest,
    responses(
        (status = 200, description = "Application withdrawn", body = ApplicationResponse),
        (status = 403, description = "Not the applicant", body = ErrorResponse),
        (status = 409, description = "Application already decided", body = ErrorResponse)
    ),
    tag = "applications"
)]
pub async fn withdraw_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarketerActionRequest>,
) -> ApiResult<Json<ApplicationResponse>> {
    let application = state
        .marketplace
        .applications
        .withdraw(ApplicationId::from_uuid(id), payload.marketer())
        .await?;
    Ok(Json(application.into()))
}
