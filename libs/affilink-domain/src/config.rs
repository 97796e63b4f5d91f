//! Configuration shared by the marketplace services

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MarketplaceError, Result};

/// Decimal places kept for every stored money amount
pub const MONEY_SCALE: u32 = 2;

/// Configuration for the marketplace services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Smallest amount a marketer may request in one withdrawal (default: 10)
    pub minimum_withdrawal: Decimal,
    /// Length of generated tracking tokens, in URL-safe characters (default: 16)
    pub tracking_token_length: usize,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            minimum_withdrawal: Decimal::TEN,
            tracking_token_length: 16,
        }
    }
}

/// Reject `amount` if it carries more decimal places than [`MONEY_SCALE`]
///
/// Trailing zeros do not count, so `10.500` is accepted as `10.50`.
pub fn ensure_money_scale(field: &str, amount: Decimal) -> Result<()> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(MarketplaceError::validation(format!(
            "{} must have at most {} decimal places, got {}",
            field, MONEY_SCALE, amount
        )));
    }
    Ok(())
}
