//! Campaign and application routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{
    handlers::{applications, campaigns},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", post(campaigns::create_campaign))
        .route(
            "/campaigns/:id",
            get(campaigns::get_campaign)
                .patch(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route("/campaigns/:id/approve", post(campaigns::approve_campaign))
        .route("/campaigns/:id/reject", post(campaigns::reject_campaign))
        .route("/campaigns/:id/pause", post(campaigns::pause_campaign))
        .route("/campaigns/:id/resume", post(campaigns::resume_campaign))
        .route("/campaigns/:id/status", put(campaigns::update_campaign_status))
        .route(
            "/companies/:company_id/campaigns",
            get(campaigns::list_company_campaigns),
        )
        .route(
            "/campaigns/:id/applications",
            post(applications::apply).get(applications::list_campaign_applications),
        )
        .route("/applications/:id", get(applications::get_application))
        .route(
            "/applications/:id/approve",
            post(applications::approve_application),
        )
        .route(
            "/applications/:id/reject",
            post(applications::reject_application),
        )
        .route(
            "/applications/:id/withdraw",
            post(applications::withdraw_application),
        )
        .route(
            "/marketers/:marketer_id/applications",
            get(applications::list_marketer_applications),
        )
}
