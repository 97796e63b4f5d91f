//! Derived attribution views; pure functions over tracking links

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::TrackingLink;
use crate::ids::{CampaignId, TrackingLinkId};

/// `conversions / clicks * 100`, or zero when there were no clicks
pub fn conversion_rate(clicks: i64, conversions: i64) -> Decimal {
    if clicks <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(conversions) / Decimal::from(clicks) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Aggregates for a single link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub tracking_link_id: TrackingLinkId,
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: Decimal,
    pub conversion_rate: Decimal,
}

impl From<&TrackingLink> for LinkStats {
    fn from(link: &TrackingLink) -> Self {
        Self {
            tracking_link_id: link.id,
            clicks: link.clicks,
            conversions: link.conversions,
            earnings: link.earnings,
            conversion_rate: conversion_rate(link.clicks, link.conversions),
        }
    }
}

/// Aggregates across every link of one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPerformance {
    pub campaign_id: CampaignId,
    pub links: usize,
    pub active_links: usize,
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: Decimal,
    pub conversion_rate: Decimal,
}

impl CampaignPerformance {
    pub fn from_links(campaign_id: CampaignId, links: &[TrackingLink]) -> Self {
        let clicks = links.iter().map(|l| l.clicks).sum();
        let conversions = links.iter().map(|l| l.conversions).sum();

        Self {
            campaign_id,
            links: links.len(),
            active_links: links.iter().filter(|l| l.is_active).count(),
            clicks,
            conversions,
            earnings: links.iter().map(|l| l.earnings).sum(),
            conversion_rate: conversion_rate(clicks, conversions),
        }
    }
}

/// Earnings of one marketer on one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignEarnings {
    pub campaign_id: CampaignId,
    pub earnings: Decimal,
    pub conversions: i64,
}

/// Group a marketer's links by campaign, ordered by campaign id
pub fn earnings_by_campaign(links: &[TrackingLink]) -> Vec<CampaignEarnings> {
    let mut grouped: BTreeMap<CampaignId, CampaignEarnings> = BTreeMap::new();

    for link in links {
        let entry = grouped
            .entry(link.campaign_id)
            .or_insert_with(|| CampaignEarnings {
                campaign_id: link.campaign_id,
                earnings: Decimal::ZERO,
                conversions: 0,
            });
        entry.earnings += link.earnings;
        entry.conversions += link.conversions;
    }

    grouped.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MarketerId;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn link(campaign_id: CampaignId, clicks: i64, conversions: i64, earnings: Decimal) -> TrackingLink {
        let mut link = TrackingLink::new(campaign_id, MarketerId::new(), "t".into(), Utc::now());
        link.clicks = clicks;
        link.conversions = conversions;
        link.earnings = earnings;
        link
    }

    #[test]
    fn test_conversion_rate_without_clicks_is_zero() {
        assert_eq!(conversion_rate(0, 0), Decimal::ZERO);
        assert_eq!(conversion_rate(0, 3), Decimal::ZERO);
    }

    #[test]
    fn test_conversion_rate_percentage() {
        assert_eq!(conversion_rate(200, 5), dec!(2.5));
        assert_eq!(conversion_rate(3, 1), dec!(33.33));
    }

    #[test]
    fn test_campaign_performance_sums_links() {
        let campaign = CampaignId::new();
        let mut inactive = link(campaign, 50, 5, dec!(25));
        inactive.is_active = false;
        let links = vec![link(campaign, 150, 5, dec!(75)), inactive];

        let perf = CampaignPerformance::from_links(campaign, &links);

        assert_eq!(perf.links, 2);
        assert_eq!(perf.active_links, 1);
        assert_eq!(perf.clicks, 200);
        assert_eq!(perf.conversions, 10);
        assert_eq!(perf.earnings, dec!(100));
        assert_eq!(perf.conversion_rate, dec!(5));
    }

    #[test]
    fn test_earnings_grouped_by_campaign() {
        let a = CampaignId::new();
        let b = CampaignId::new();
        let links = vec![link(a, 10, 1, dec!(3)), link(b, 10, 2, dec!(8)), link(a, 5, 1, dec!(2))];

        let grouped = earnings_by_campaign(&links);

        assert_eq!(grouped.len(), 2);
        let for_a = grouped.iter().find(|e| e.campaign_id == a).unwrap();
        assert_eq!(for_a.earnings, dec!(5));
        assert_eq!(for_a.conversions, 2);
    }
}
