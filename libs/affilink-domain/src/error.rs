//! Domain errors for marketplace operations
//!
//! Every public operation returns `Result<T, MarketplaceError>`. Business-rule
//! violations are ordinary values, only adapter faults (`StorageFailure`) and
//! corrupted persisted state (`Integrity`) signal something unexpected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur in the campaign lifecycle and settlement core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketplaceError {
    /// A referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Caller input violates a stated constraint
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A state-machine transition was attempted from a state that forbids it
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The actor does not own the target entity or lacks the role for the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A uniqueness rule was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The marketer's available balance does not cover the amount
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    /// A date window has closed
    #[error("Expired: {0}")]
    Expired(String),

    /// Persisted state is inconsistent (e.g. a negative derived balance)
    #[error("Data integrity violation: {0}")]
    Integrity(String),

    /// The storage backend failed
    #[error("Storage operation failed: {0}")]
    StorageFailure(String),
}

/// Stable error kind exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    InvalidOperation,
    Forbidden,
    Conflict,
    InsufficientFunds,
    Expired,
    Integrity,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidOperation => "invalid_operation",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::Expired => "expired",
            ErrorKind::Integrity => "integrity",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MarketplaceError {
    /// Create a not-found error for the named entity
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a validation error with a message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid operation error with a message
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a forbidden error with a message
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a conflict error with a message
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an insufficient funds error
    pub fn insufficient_funds(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            requested,
            available,
        }
    }

    /// Create an expired error with a message
    pub fn expired(msg: impl Into<String>) -> Self {
        Self::Expired(msg.into())
    }

    /// Create an integrity error with a message
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Create a storage failure error with a message
    pub fn storage_failure(msg: impl Into<String>) -> Self {
        Self::StorageFailure(msg.into())
    }

    /// The stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Expired(_) => ErrorKind::Expired,
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::StorageFailure(_) => ErrorKind::StorageFailure,
        }
    }

    /// Whether this is an expected business-rule rejection rather than a fault
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, Self::Integrity(_) | Self::StorageFailure(_))
    }
}

/// Result type alias for marketplace operations
pub type Result<T> = std::result::Result<T, MarketplaceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_not_found_error() {
        let err = MarketplaceError::not_found("Campaign", "abc-123");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Campaign abc-123 not found");
    }

    #[test]
    fn test_insufficient_funds_error() {
        let err = MarketplaceError::insufficient_funds(dec!(300), dec!(250));
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert!(err.to_string().contains("300"));
        assert!(err.to_string().contains("250"));
    }

    #[test]
    fn test_faults_are_not_business_rules() {
        assert!(!MarketplaceError::storage_failure("connection reset").is_business_rule());
        assert!(!MarketplaceError::integrity("negative balance").is_business_rule());
        assert!(MarketplaceError::conflict("duplicate").is_business_rule());
        assert!(MarketplaceError::expired("ended").is_business_rule());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::InvalidOperation.to_string(), "invalid_operation");
        assert_eq!(
            MarketplaceError::validation("note required").kind().as_str(),
            "validation"
        );
    }
}
