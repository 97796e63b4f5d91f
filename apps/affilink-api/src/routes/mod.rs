//! API routes

pub mod campaigns;
pub mod settlement;
pub mod tracking;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    dto::{
        applications::{
            ApplicationResponse, ApplyRequest, ApproveApplicationRequest,
            ApprovedApplicationResponse, MarketerActionRequest, RejectApplicationRequest,
        },
        campaigns::{
            ApproveCampaignRequest, CampaignResponse, CompanyActionRequest,
            CreateCampaignRequest, DeleteCampaignResponse, RejectCampaignRequest,
            UpdateCampaignRequest, UpdateStatusRequest,
        },
        payments::{BalanceResponse, CompletePaymentRequest, PaymentResponse},
        tracking::{
            CampaignEarningsResponse, CampaignPerformanceResponse, LinkStatsResponse,
            PerformanceLogResponse, RecordEventRequest, TrackingLinkResponse,
        },
        withdrawals::{
            AddPaymentMethodRequest, ApproveWithdrawalRequest, CompleteTransferRequest,
            CreateWithdrawalRequest, FailTransferRequest, PaymentMethodResponse,
            RejectWithdrawalRequest, WithdrawalResponse,
        },
        ErrorResponse,
    },
    handlers, AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::campaigns::create_campaign,
        handlers::campaigns::get_campaign,
        handlers::campaigns::list_company_campaigns,
        handlers::campaigns::approve_campaign,
        handlers::campaigns::reject_campaign,
        handlers::campaigns::pause_campaign,
        handlers::campaigns::resume_campaign,
        handlers::campaigns::update_campaign_status,
        handlers::campaigns::update_campaign,
        handlers::campaigns::delete_campaign,
        handlers::applications::apply,
        handlers::applications::list_campaign_applications,
        handlers::applications::list_marketer_applications,
        handlers::applications::get_application,
        handlers::applications::approve_application,
        handlers::applications::reject_application,
        handlers::applications::withdraw_application,
        handlers::tracking::record_event,
        handlers::tracking::get_link,
        handlers::tracking::link_stats,
        handlers::tracking::performance_log,
        handlers::tracking::deactivate_link,
        handlers::tracking::campaign_performance,
        handlers::tracking::marketer_links,
        handlers::tracking::marketer_earnings,
        handlers::payments::marketer_balance,
        handlers::payments::get_payment,
        handlers::payments::list_user_payments,
        handlers::payments::mark_payment_processing,
        handlers::payments::complete_payment,
        handlers::payments::fail_payment,
        handlers::payments::cancel_payment,
        handlers::withdrawals::create_withdrawal,
        handlers::withdrawals::get_withdrawal,
        handlers::withdrawals::list_marketer_withdrawals,
        handlers::withdrawals::approve_withdrawal,
        handlers::withdrawals::reject_withdrawal,
        handlers::withdrawals::mark_withdrawal_processing,
        handlers::withdrawals::complete_withdrawal,
        handlers::withdrawals::fail_withdrawal,
        handlers::withdrawals::add_payment_method,
        handlers::withdrawals::list_payment_methods,
        handlers::withdrawals::set_default_payment_method,
        handlers::withdrawals::delete_payment_method,
        health_handler
    ),
    components(
        schemas(
            CreateCampaignRequest, UpdateCampaignRequest, ApproveCampaignRequest,
            RejectCampaignRequest, CompanyActionRequest, UpdateStatusRequest,
            CampaignResponse, DeleteCampaignResponse,
            ApplyRequest, MarketerActionRequest, ApproveApplicationRequest,
            RejectApplicationRequest, ApplicationResponse, ApprovedApplicationResponse,
            RecordEventRequest, TrackingLinkResponse, LinkStatsResponse,
            CampaignPerformanceResponse, CampaignEarningsResponse, PerformanceLogResponse,
            CompletePaymentRequest, PaymentResponse, BalanceResponse,
            CreateWithdrawalRequest, ApproveWithdrawalRequest, RejectWithdrawalRequest,
            CompleteTransferRequest, FailTransferRequest, WithdrawalResponse,
            AddPaymentMethodRequest, PaymentMethodResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "campaigns", description = "Campaign lifecycle"),
        (name = "applications", description = "Marketer applications to campaigns"),
        (name = "tracking", description = "Tracking links and attribution"),
        (name = "payments", description = "Payments and derived balances"),
        (name = "withdrawals", description = "Withdrawal settlement"),
        (name = "payment-methods", description = "Marketer payout methods"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "AffiLink API",
        version = "0.1.0",
        description = "Affiliate marketplace: campaigns, attribution and commission settlement",
        contact(
            name = "AffiLink Team"
        )
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(campaigns::routes())
        .merge(tracking::routes())
        .merge(settlement::routes())
        .route("/health", axum::routing::get(health_handler))
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_settlement_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/withdrawals"));
        assert!(paths.contains_key("/withdrawals/{id}/approve"));
        assert!(paths.contains_key("/marketers/{marketer_id}/balance"));
        assert!(paths.contains_key("/health"));
    }
}
