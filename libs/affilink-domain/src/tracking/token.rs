//! Tracking token generation
//!
//! Tokens are SHA-256 digests of (marketer, campaign, nanosecond timestamp,
//! random salt) encoded as unpadded base64url and truncated. The storage
//! layer's unique constraint stays the authoritative collision guard.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::ids::{CampaignId, MarketerId};
use crate::ports::TokenGenerator;

/// Longest token a SHA-256 digest can yield in base64url
pub const MAX_TOKEN_LENGTH: usize = 43;

/// Default hash-based tracking token generator
#[derive(Debug, Clone)]
pub struct HashTokenGenerator {
    length: usize,
}

impl HashTokenGenerator {
    /// Create a generator producing tokens of `length` characters (clamped to 8..=43)
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(8, MAX_TOKEN_LENGTH),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for HashTokenGenerator {
    fn default() -> Self {
        Self::new(16)
    }
}

impl TokenGenerator for HashTokenGenerator {
    fn generate(&self, marketer_id: MarketerId, campaign_id: CampaignId, at: DateTime<Utc>) -> String {
        let mut salt = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut salt);

        let mut hasher = Sha256::new();
        hasher.update(marketer_id.as_uuid().as_bytes());
        hasher.update(campaign_id.as_uuid().as_bytes());
        hasher.update(at.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
        hasher.update(salt);

        let mut token = URL_SAFE_NO_PAD.encode(hasher.finalize());
        token.truncate(self.length);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_has_requested_length() {
        let generator = HashTokenGenerator::new(20);
        let token = generator.generate(MarketerId::new(), CampaignId::new(), Utc::now());

        assert_eq!(token.len(), 20);
    }

    #[test]
    fn test_token_is_url_safe() {
        let generator = HashTokenGenerator::default();
        let token = generator.generate(MarketerId::new(), CampaignId::new(), Utc::now());

        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_length_is_clamped() {
        assert_eq!(HashTokenGenerator::new(2).length(), 8);
        assert_eq!(HashTokenGenerator::new(500).length(), MAX_TOKEN_LENGTH);
    }

    #[test]
    fn test_same_inputs_still_differ() {
        let generator = HashTokenGenerator::default();
        let marketer = MarketerId::new();
        let campaign = CampaignId::new();
        let at = Utc::now();

        let tokens: HashSet<String> = (0..100)
            .map(|_| generator.generate(marketer, campaign, at))
            .collect();

        assert_eq!(tokens.len(), 100);
    }
}
