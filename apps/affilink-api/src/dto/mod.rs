//! Request and response bodies

pub mod applications;
pub mod campaigns;
pub mod payments;
pub mod tracking;
pub mod withdrawals;

use serde::Serialize;
use utoipa::ToSchema;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error description
    #[schema(example = "Campaign 0192f1c4-7b1a-7c3e-9a55-3f1d2c4b5a69 not found")]
    pub error: String,
    /// Stable error kind callers can branch on
    #[schema(example = "not_found")]
    pub kind: String,
}
