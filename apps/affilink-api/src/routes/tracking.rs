//! Tracking routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers::tracking, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tracking-links/:id", get(tracking::get_link))
        .route("/tracking-links/:id/events", post(tracking::record_event))
        .route("/tracking-links/:id/stats", get(tracking::link_stats))
        .route("/tracking-links/:id/log", get(tracking::performance_log))
        .route(
            "/tracking-links/:id/deactivate",
            post(tracking::deactivate_link),
        )
        .route(
            "/campaigns/:id/performance",
            get(tracking::campaign_performance),
        )
        .route(
            "/marketers/:marketer_id/tracking-links",
            get(tracking::marketer_links),
        )
        .route(
            "/marketers/:marketer_id/earnings",
            get(tracking::marketer_earnings),
        )
}
