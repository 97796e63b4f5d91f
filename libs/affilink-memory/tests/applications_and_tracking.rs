//! Integration tests for applications, tracking links and the performance log

mod common;

use std::sync::Arc;

use affilink_domain::application::ApplicationStatus;
use affilink_domain::campaign::CampaignStatus;
use affilink_domain::payment::{PaymentStatus, PaymentType};
use affilink_domain::ports::{MockNotifier, MockTokenGenerator};
use affilink_domain::tracking::EventType;
use affilink_domain::{ErrorKind, MarketerId, Marketplace, MarketplaceConfig, ServiceContext};
use affilink_memory::{InMemoryDirectory, InMemoryStore, ManualClock, RecordingAuditSink};
use chrono::Duration;
use common::{start_of_test, Harness};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_apply_then_apply_again_conflicts() {
    let harness = Harness::new();
    let (_, campaign) = harness.active_campaign().await;
    let marketer = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let application = applications.apply(campaign.id, marketer.id).await.unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert!(application.responded_at.is_none());

    let err = applications
        .apply(campaign.id, marketer.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        applications
            .list_for_marketer(marketer.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_reapply_after_rejection_conflicts() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let marketer = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let application = applications.apply(campaign.id, marketer.id).await.unwrap();
    applications
        .reject(application.id, company.id, "audience mismatch")
        .await
        .unwrap();

    let err = applications
        .apply(campaign.id, marketer.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_apply_requires_active_campaign_in_window() {
    let harness = Harness::new();
    let (_, pending) = harness.pending_campaign().await;
    let (_, active) = harness.active_campaign().await;
    let marketer = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let err = applications.apply(pending.id, marketer.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    harness.clock.advance(Duration::days(31));
    let err = applications.apply(active.id, marketer.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let err = applications
        .apply(active.id, MarketerId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_approval_issues_one_fresh_tracking_link() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let marketer = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let application = applications.apply(campaign.id, marketer.id).await.unwrap();
    let approved = applications
        .approve(application.id, company.id, Some("welcome aboard".to_string()))
        .await
        .unwrap();

    assert_eq!(approved.application.status, ApplicationStatus::Accepted);
    assert_eq!(
        approved.application.response_note.as_deref(),
        Some("welcome aboard")
    );
    assert!(approved.link_created);

    let link = &approved.tracking_link;
    assert_eq!(link.clicks, 0);
    assert_eq!(link.conversions, 0);
    assert_eq!(link.earnings, Decimal::ZERO);
    assert!(link.is_active);
    assert_eq!(link.token.len(), 16);

    let links = harness
        .marketplace
        .tracking
        .links_for_marketer(marketer.id)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_second_approval_creates_no_second_link() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (marketer, link) = harness.promoter(&company, &campaign).await;

    let application = harness
        .marketplace
        .applications
        .list_for_marketer(marketer.id)
        .await
        .unwrap()
        .remove(0);
    let err = harness
        .marketplace
        .applications
        .approve(application.id, company.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let links = harness
        .marketplace
        .tracking
        .links_for_marketer(marketer.id)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].id, link.id);
}

#[tokio::test]
async fn test_only_campaign_owner_decides() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let stranger = harness.directory.add_company(true).await;
    let marketer = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let application = applications.apply(campaign.id, marketer.id).await.unwrap();

    let err = applications
        .approve(application.id, stranger.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = applications
        .list_for_campaign(campaign.id, stranger.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let listed = applications
        .list_for_campaign(campaign.id, company.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_reject_requires_note() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let marketer = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let application = applications.apply(campaign.id, marketer.id).await.unwrap();

    let err = applications
        .reject(application.id, company.id, " ")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        applications.get(application.id).await.unwrap().status,
        ApplicationStatus::Pending
    );
}

#[tokio::test]
async fn test_withdraw_only_by_applicant_while_pending() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let marketer = harness.directory.add_marketer().await;
    let other = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let application = applications.apply(campaign.id, marketer.id).await.unwrap();

    let err = applications
        .withdraw(application.id, other.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let withdrawn = applications
        .withdraw(application.id, marketer.id)
        .await
        .unwrap();
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    assert!(withdrawn.responded_at.is_some());

    let err = applications
        .approve(application.id, company.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

/// A colliding token rolls back the application decision with it
#[tokio::test]
async fn test_token_collision_rolls_back_approval() {
    let mut tokens = MockTokenGenerator::new();
    tokens
        .expect_generate()
        .returning(|_, _, _| "same-token-every-time".to_string());
    let harness = Harness::with_tokens(Arc::new(tokens));

    let (company, campaign) = harness.active_campaign().await;
    let (first, _) = harness.promoter(&company, &campaign).await;
    let second = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let application = applications.apply(campaign.id, second.id).await.unwrap();
    let err = applications
        .approve(application.id, company.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(
        applications.get(application.id).await.unwrap().status,
        ApplicationStatus::Pending
    );
    assert!(harness
        .marketplace
        .tracking
        .links_for_marketer(second.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        harness
            .marketplace
            .tracking
            .links_for_marketer(first.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_events_move_counters_and_log() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (marketer, link) = harness.promoter(&company, &campaign).await;
    let tracking = &harness.marketplace.tracking;

    tracking
        .record_event(link.id, EventType::Impression, Decimal::ZERO)
        .await
        .unwrap();
    for _ in 0..4 {
        tracking
            .record_event(link.id, EventType::Click, Decimal::ZERO)
            .await
            .unwrap();
    }
    tracking
        .record_event(link.id, EventType::Lead, Decimal::ZERO)
        .await
        .unwrap();
    let after = tracking
        .record_event(link.id, EventType::Conversion, dec!(12.40))
        .await
        .unwrap();

    assert_eq!(after.clicks, 4);
    assert_eq!(after.conversions, 1);
    assert_eq!(after.earnings, dec!(12.40));

    let log = tracking.performance_log(link.id).await.unwrap();
    assert_eq!(log.len(), 7);
    assert_eq!(log[0].event_type, EventType::Impression);
    assert_eq!(log[6].amount_earned, dec!(12.40));

    let stats = tracking.link_stats(link.id).await.unwrap();
    assert_eq!(stats.conversion_rate, dec!(25));

    let commissions: Vec<_> = harness
        .marketplace
        .payments
        .list_for_user(marketer.user_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.payment_type == PaymentType::Commission)
        .collect();
    assert_eq!(commissions.len(), 1);
    assert_eq!(commissions[0].status, PaymentStatus::Pending);
    assert_eq!(commissions[0].campaign_id, Some(campaign.id));
}

#[tokio::test]
async fn test_event_amount_rules() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (_, link) = harness.promoter(&company, &campaign).await;
    let tracking = &harness.marketplace.tracking;

    let err = tracking
        .record_event(link.id, EventType::Conversion, dec!(-1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = tracking
        .record_event(link.id, EventType::Click, dec!(3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = tracking
        .record_event(link.id, EventType::Conversion, dec!(0.004))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(tracking.performance_log(link.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_clicks_are_not_lost() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (_, link) = harness.promoter(&company, &campaign).await;
    let link_id = link.id;

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let marketplace = harness.marketplace.clone();
            tokio::spawn(async move {
                marketplace
                    .tracking
                    .record_event(link_id, EventType::Click, Decimal::ZERO)
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stats = harness.marketplace.tracking.link_stats(link_id).await.unwrap();
    assert_eq!(stats.clicks, 25);
}

#[tokio::test]
async fn test_deactivate_twice_is_invalid() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (marketer, link) = harness.promoter(&company, &campaign).await;
    let tracking = &harness.marketplace.tracking;

    let err = tracking
        .deactivate(link.id, MarketerId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let deactivated = tracking.deactivate(link.id, marketer.id).await.unwrap();
    assert!(!deactivated.is_active);

    let err = tracking.deactivate(link.id, marketer.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let err = tracking
        .record_event(link.id, EventType::Click, Decimal::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

#[tokio::test]
async fn test_campaign_performance_and_earnings_views() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (alice, alice_link) = harness.promoter(&company, &campaign).await;
    let (_, bob_link) = harness.promoter(&company, &campaign).await;
    let tracking = &harness.marketplace.tracking;

    for link in [&alice_link, &alice_link, &bob_link, &bob_link] {
        tracking
            .record_event(link.id, EventType::Click, Decimal::ZERO)
            .await
            .unwrap();
    }
    tracking
        .record_event(alice_link.id, EventType::Conversion, dec!(30))
        .await
        .unwrap();
    tracking.deactivate(bob_link.id, bob_link.marketer_id).await.unwrap();

    let performance = tracking.campaign_performance(campaign.id).await.unwrap();
    assert_eq!(performance.links, 2);
    assert_eq!(performance.active_links, 1);
    assert_eq!(performance.clicks, 4);
    assert_eq!(performance.conversions, 1);
    assert_eq!(performance.earnings, dec!(30));
    assert_eq!(performance.conversion_rate, dec!(25));

    let earnings = tracking.earnings_by_campaign(alice.id).await.unwrap();
    assert_eq!(earnings.len(), 1);
    assert_eq!(earnings[0].campaign_id, campaign.id);
    assert_eq!(earnings[0].earnings, dec!(30));
}

#[tokio::test]
async fn test_conversion_rate_without_clicks_is_zero() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let (_, link) = harness.promoter(&company, &campaign).await;

    let stats = harness.marketplace.tracking.link_stats(link.id).await.unwrap();

    assert_eq!(stats.conversion_rate, Decimal::ZERO);
}

/// The applicant hears about the decision exactly once
#[tokio::test]
async fn test_decision_notifies_applicant() {
    let store = InMemoryStore::new();
    let directory = InMemoryDirectory::new();
    let company = directory.add_company(true).await;
    let category = directory.add_category().await;
    let marketer = directory.add_marketer().await;

    let company_user = company.user_id;
    let marketer_user = marketer.user_id;
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(move |n| n.user_id == company_user)
        .times(2)
        .return_const(());
    notifier
        .expect_notify()
        .withf(move |n| n.user_id == marketer_user && n.title == "Application approved")
        .times(1)
        .return_const(());

    let ctx = ServiceContext::new(
        Arc::new(RecordingAuditSink::default()),
        Arc::new(notifier),
        MarketplaceConfig::default(),
    )
    .with_clock(Arc::new(ManualClock::new(start_of_test())));
    let marketplace = Marketplace::new(store, directory, ctx);

    let input = {
        let now = start_of_test();
        affilink_domain::campaign::NewCampaign {
            title: "Autumn boots".to_string(),
            description: "Boots for the rainy season".to_string(),
            category_id: category,
            commission_type: affilink_domain::campaign::CommissionType::Fixed,
            commission_value: dec!(4),
            budget: None,
            start_date: now,
            end_date: now + Duration::days(10),
            promotional_materials: None,
        }
    };
    let campaign = marketplace
        .campaigns
        .create(company.id, input)
        .await
        .unwrap();
    let campaign = marketplace
        .campaigns
        .approve(campaign.id, affilink_domain::AdminId::new())
        .await
        .unwrap();
    assert_eq!(campaign.status, CampaignStatus::Active);

    let application = marketplace
        .applications
        .apply(campaign.id, marketer.id)
        .await
        .unwrap();
    marketplace
        .applications
        .approve(application.id, company.id, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_archived_campaign_takes_no_more_decisions() {
    let harness = Harness::new();
    let (company, campaign) = harness.active_campaign().await;
    let first = harness.directory.add_marketer().await;
    let second = harness.directory.add_marketer().await;
    let applications = &harness.marketplace.applications;

    let pending = applications.apply(campaign.id, first.id).await.unwrap();
    let other = applications.apply(campaign.id, second.id).await.unwrap();

    harness
        .marketplace
        .campaigns
        .pause(campaign.id, company.id)
        .await
        .unwrap();
    harness
        .marketplace
        .campaigns
        .delete(campaign.id, company.id)
        .await
        .unwrap();

    let err = applications
        .approve(pending.id, company.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = applications
        .reject(other.id, company.id, "campaign closed")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(
        applications.get(pending.id).await.unwrap().status,
        ApplicationStatus::Pending
    );
    assert!(harness
        .marketplace
        .tracking
        .links_for_marketer(first.id)
        .await
        .unwrap()
        .is_empty());
}
