//! Environment configuration for the HTTP host

use affilink_domain::tracking::MAX_TOKEN_LENGTH;
use affilink_domain::{ensure_money_scale, MarketplaceConfig};
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Settings read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub log_json: bool,
    pub marketplace: MarketplaceConfig,
}

impl AppConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; invalid values are errors
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let defaults = MarketplaceConfig::default();
        let marketplace = MarketplaceConfig {
            minimum_withdrawal: parse_or(
                &lookup,
                "AFFILINK_MIN_WITHDRAWAL",
                defaults.minimum_withdrawal,
            )?,
            tracking_token_length: parse_or(
                &lookup,
                "AFFILINK_TOKEN_LENGTH",
                defaults.tracking_token_length,
            )?,
        };

        if marketplace.minimum_withdrawal <= Decimal::ZERO {
            bail!("AFFILINK_MIN_WITHDRAWAL must be positive");
        }
        ensure_money_scale("AFFILINK_MIN_WITHDRAWAL", marketplace.minimum_withdrawal)?;
        if !(8..=MAX_TOKEN_LENGTH).contains(&marketplace.tracking_token_length) {
            bail!("AFFILINK_TOKEN_LENGTH must be between 8 and {MAX_TOKEN_LENGTH}");
        }

        Ok(Self {
            database_url,
            host: lookup("AFFILINK_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "AFFILINK_PORT", 3000)?,
            db_max_connections: parse_or(&lookup, "AFFILINK_DB_MAX_CONNECTIONS", 10)?,
            log_json: parse_or(&lookup, "AFFILINK_LOG_JSON", false)?,
            marketplace,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow::anyhow!("invalid {key} '{raw}': {err}")),
    }
}
