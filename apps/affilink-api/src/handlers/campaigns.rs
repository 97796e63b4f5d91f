//! Campaign handlers

use affilink_domain::{AdminId, CampaignId, CompanyId};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::campaigns::{
        ApproveCampaignRequest, CampaignResponse, CompanyActionRequest, CompanyQuery,
        CreateCampaignRequest, DeleteCampaignResponse, RejectCampaignRequest,
        UpdateCampaignRequest, UpdateStatusRequest,
    },
    dto::ErrorResponse,
    error::ApiResult,
    AppState,
};

/// Create a campaign in `pending` status
#[utoipa::path(
    post,
    path = "/campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign created", body = CampaignResponse),
        (status = 400, description = "Invalid dates, commission or budget", body = ErrorResponse),
        (status = 403, description = "Company is not verified", body = ErrorResponse),
        (status = 404, description = "Unknown company or category", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(payload): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<CampaignResponse>)> {
    let (company_id, input) = payload.into_parts();
    info!(company_id = %company_id, "Received campaign creation request");

    let campaign = state.marketplace.campaigns.create(company_id, input).await?;
    Ok((StatusCode::CREATED, Json(campaign.into())))
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign found", body = CampaignResponse),
        (status = 404, description = "Campaign not found or archived", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state
        .marketplace
        .campaigns
        .get(CampaignId::from_uuid(id))
        .await?;
    Ok(Json(campaign.into()))
}

#[utoipa::path(
    get,
    path = "/companies/{company_id}/campaigns",
    params(("company_id" = Uuid, Path, description = "Owning company")),
    responses(
        (status = 200, description = "Live campaigns of the company", body = [CampaignResponse])
    ),
    tag = "campaigns"
)]
pub async fn list_company_campaigns(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CampaignResponse>>> {
    let campaigns = state
        .marketplace
        .campaigns
        .list_for_company(CompanyId::from_uuid(company_id))
        .await?;
    Ok(Json(campaigns.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/approve",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = ApproveCampaignRequest,
    responses(
        (status = 200, description = "Campaign is active", body = CampaignResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
        (status = 409, description = "Campaign is not pending", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn approve_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveCampaignRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state
        .marketplace
        .campaigns
        .approve(CampaignId::from_uuid(id), payload.admin())
        .await?;
    Ok(Json(campaign.into()))
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/reject",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = RejectCampaignRequest,
    responses(
        (status = 200, description = "Campaign rejected", body = CampaignResponse),
        (status = 400, description = "Missing rejection note", body = ErrorResponse),
        (status = 409, description = "Campaign is not pending", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn reject_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectCampaignRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state
        .marketplace
        .campaigns
        .reject(
            CampaignId::from_uuid(id),
            AdminId::from_uuid(payload.admin_id),
            &payload.note,
        )
        .await?;
    Ok(Json(campaign.into()))
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/pause",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = CompanyActionRequest,
    responses(
        (status = 200, description = "Campaign paused", body = CampaignResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 409, description = "Campaign is not active", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn pause_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompanyActionRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state
        .marketplace
        .campaigns
        .pause(CampaignId::from_uuid(id), payload.company())
        .await?;
    Ok(Json(campaign.into()))
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/resume",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = CompanyActionRequest,
    responses(
        (status = 200, description = "Campaign active again", body = CampaignResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 409, description = "Campaign is not paused", body = ErrorResponse),
        (status = 410, description = "Campaign end date has passed", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn resume_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompanyActionRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state
        .marketplace
        .campaigns
        .resume(CampaignId::from_uuid(id), payload.company())
        .await?;
    Ok(Json(campaign.into()))
}

#[utoipa::path(
    put,
    path = "/campaigns/{id}/status",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = CampaignResponse),
        (status = 403, description = "Not the owner, or an admin-only status", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn update_campaign_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state
        .marketplace
        .campaigns
        .update_status(
            CampaignId::from_uuid(id),
            payload.status,
            CompanyId::from_uuid(payload.company_id),
        )
        .await?;
    Ok(Json(campaign.into()))
}

#[utoipa::path(
    patch,
    path = "/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = CampaignResponse),
        (status = 400, description = "Edited campaign is invalid", body = ErrorResponse),
        (status = 403, description = "Not the owner, or a non-cosmetic edit of an active campaign", body = ErrorResponse),
        (status = 409, description = "Campaign can no longer be edited", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let (company_id, update) = payload.into_parts();
    let campaign = state
        .marketplace
        .campaigns
        .update(CampaignId::from_uuid(id), update, company_id)
        .await?;
    Ok(Json(campaign.into()))
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign id"), CompanyQuery),
    responses(
        (status = 200, description = "Campaign removed or archived", body = DeleteCampaignResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 409, description = "Active campaigns cannot be deleted", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<Json<DeleteCampaignResponse>> {
    let outcome = state
        .marketplace
        .campaigns
        .delete(CampaignId::from_uuid(id), query.company())
        .await?;
    Ok(Json(outcome.into()))
}
