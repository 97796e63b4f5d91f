//! Translation of sqlx errors into domain errors

use affilink_domain::MarketplaceError;
use tracing::error;

/// Map a database error raised while performing `operation`
///
/// Unique-constraint violations become `Conflict`; everything else is a
/// `StorageFailure` and gets logged, since the caller only sees the message.
pub(crate) fn map_db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> MarketplaceError {
    move |err| {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                return MarketplaceError::conflict(format!("{operation}: {constraint} violated"));
            }
        }

        error!(operation, error = ?err, "Database operation failed");
        MarketplaceError::storage_failure(format!("{operation} failed: {err}"))
    }
}

/// Fail with `NotFound` when an UPDATE or DELETE touched no row
pub(crate) fn expect_one_row(
    rows_affected: u64,
    entity: &'static str,
    id: impl std::fmt::Display,
) -> Result<(), MarketplaceError> {
    if rows_affected == 0 {
        return Err(MarketplaceError::not_found(entity, id));
    }
    Ok(())
}
