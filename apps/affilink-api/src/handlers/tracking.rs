//! Tracking and attribution handlers

use affilink_domain::{CampaignId, MarketerId, TrackingLinkId};
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::applications::MarketerActionRequest,
    dto::tracking::{
        CampaignEarningsResponse, CampaignPerformanceResponse, LinkStatsResponse,
        PerformanceLogResponse, RecordEventRequest, TrackingLinkResponse,
    },
    dto::ErrorResponse,
    error::ApiResult,
    AppState,
};

/// Record an impression, click, lead or conversion on a link
#[utoipa::path(
    post,
    path = "/tracking-links/{id}/events",
    params(("id" = Uuid, Path, description = "Tracking link id")),
    request_body = RecordEventRequest,
    responses(
        (status = 200, description = "Event recorded", body = TrackingLinkResponse),
        (status = 400, description = "Invalid amount for the event", body = ErrorResponse),
        (status = 404, description = "Tracking link not found", body = ErrorResponse),
        (status = 409, description = "Tracking link is inactive", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn record_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordEventRequest>,
) -> ApiResult<Json<TrackingLinkResponse>> {
    debug!(tracking_link_id = %id, event = %payload.event_type, "Received tracking event");

    let link = state
        .marketplace
        .tracking
        .record_event(
            TrackingLinkId::from_uuid(id),
            payload.event_type,
            payload.amount_earned,
        )
        .await?;
    Ok(Json(link.into()))
}

#[utoipa::path(
    get,
    path = "/tracking-links/{id}",
    params(("id" = Uuid, Path, description = "Tracking link id")),
    responses(
        (status = 200, description = "Tracking link found", body = TrackingLinkResponse),
        (status = 404, description = "Tracking link not found", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrackingLinkResponse>> {
    let link = state
        .marketplace
        .tracking
        .get(TrackingLinkId::from_uuid(id))
        .await?;
    Ok(Json(link.into()))
}

#[utoipa::path(
    get,
    path = "/tracking-links/{id}/stats",
    params(("id" = Uuid, Path, description = "Tracking link id")),
    responses(
        (status = 200, description = "Counters and conversion rate", body = LinkStatsResponse),
        (status = 404, description = "Tracking link not found", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn link_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LinkStatsResponse>> {
    let stats = state
        .marketplace
        .tracking
        .link_stats(TrackingLinkId::from_uuid(id))
        .await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/tracking-links/{id}/log",
    params(("id" = Uuid, Path, description = "Tracking link id")),
    responses(
        (status = 200, description = "Logged events, oldest first", body = [PerformanceLogResponse]),
        (status = 404, description = "Tracking link not found", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn performance_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PerformanceLogResponse>>> {
    let entries = state
        .marketplace
        .tracking
        .performance_log(TrackingLinkId::from_uuid(id))
        .await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/tracking-links/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Tracking link id")),
    request_body = MarketerActionRequest,
    responses(
        (status = 200, description = "Link deactivated", body = TrackingLinkResponse),
        (status = 403, description = "Not the link owner", body = ErrorResponse),
        (status = 409, description = "Link already inactive", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn deactivate_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarketerActionRequest>,
) -> ApiResult<Json<TrackingLinkResponse>> {
    let link = state
        .marketplace
        .tracking
        .deactivate(TrackingLinkId::from_uuid(id), payload.marketer())
        .await?;
    Ok(Json(link.into()))
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}/performance",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Totals across the campaign's links", body = CampaignPerformanceResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn campaign_performance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CampaignPerformanceResponse>> {
    let performance = state
        .marketplace
        .tracking
        .campaign_performance(CampaignId::from_uuid(id))
        .await?;
    Ok(Json(performance.into()))
}

#[utoipa::path(
    get,
    path = "/marketers/{marketer_id}/tracking-links",
    params(("marketer_id" = Uuid, Path, description = "Marketer id")),
    responses(
        (status = 200, description = "Links of the marketer", body = [TrackingLinkResponse])
    ),
    tag = "tracking"
)]
pub async fn marketer_links(
    State(state): State<AppState>,
    Path(marketer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TrackingLinkResponse>>> {
    let links = state
        .marketplace
        .tracking
        .links_for_marketer(MarketerId::from_uuid(marketer_id))
        .await?;
    Ok(Json(links.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/marketers/{marketer_id}/earnings",
    params(("marketer_id" = Uuid, Path, description = "Marketer id")),
    responses(
        (status = 200, description = "Attributed earnings per campaign", body = [CampaignEarningsResponse])
    ),
    tag = "tracking"
)]
pub async fn marketer_earnings(
    State(state): State<AppState>,
    Path(marketer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CampaignEarningsResponse>>> {
    let earnings = state
        .marketplace
        .tracking
        .earnings_by_campaign(MarketerId::from_uuid(marketer_id))
        .await?;
    Ok(Json(earnings.into_iter().map(Into::into).collect()))
}
