//! Integration tests for plan changes and failed-payment recovery.
//!
//! These tests verify the path an upgrade or downgrade takes:
//! 1. The timeframe decision against the catalog
//! 2. The change request built for the provider
//! 3. The restore point written before the change, and its consumption
//!    when the payment fails

use std::sync::Arc;

use entitlements::adapters::memory::{
    InMemoryDeletedSubscriptionStore, InMemorySubscriptionRepository, RecordingScheduler,
};
use entitlements::application::handlers::subscription::SubscriptionRecoveryHandler;
use entitlements::domain::features::FeatureSet;
use entitlements::domain::foundation::{Timestamp, UserId};
use entitlements::domain::payment::{
    ChangeTimeframe, PendingChange, ProviderState, ProviderSubscription, SubscriptionAddOn,
};
use entitlements::domain::plans::{
    BillingPeriod, PlanCatalog, PlanDefinition, AI_ADD_ON_CODE,
};
use entitlements::domain::subscription::Subscription;

fn plan(code: &str, cents: i64, period: BillingPeriod) -> PlanDefinition {
    PlanDefinition {
        plan_code: code.to_string(),
        name: code.to_string(),
        features: FeatureSet::new(),
        group_plan: false,
        members_limit: 0,
        price_in_cents: cents,
        members_limit_add_on: None,
        period,
    }
}

fn catalog() -> PlanCatalog {
    PlanCatalog::new([
        plan("collaborator", 1500, BillingPeriod::Monthly),
        plan("professional", 3000, BillingPeriod::Monthly),
        plan("assistant", 900, BillingPeriod::Monthly),
        plan("assistant-annual", 8900, BillingPeriod::Annual),
    ])
}

fn provider_subscription(plan_code: &str) -> ProviderSubscription {
    ProviderSubscription {
        id: "provider-sub-1".to_string(),
        plan_code: plan_code.to_string(),
        state: ProviderState::Active,
        add_ons: Vec::new(),
        trial_start: None,
        trial_end: None,
        pending_change: None,
    }
}

#[test]
fn downgrades_wait_for_term_end_and_upgrades_apply_now() {
    let catalog = catalog();
    let now = Timestamp::now();

    let current = provider_subscription("professional");
    assert!(current
        .should_change_at_term_end(&catalog, "collaborator", now)
        .unwrap());

    let current = provider_subscription("collaborator");
    assert!(!current
        .should_change_at_term_end(&catalog, "professional", now)
        .unwrap());
}

#[test]
fn trials_always_change_immediately() {
    let catalog = catalog();
    let now = Timestamp::now();

    let mut current = provider_subscription("professional");
    current.trial_end = Some(now.add_days(10));
    assert!(!current
        .should_change_at_term_end(&catalog, "collaborator", now)
        .unwrap());
}

#[test]
fn leaving_the_standalone_ai_plan_keeps_the_assistant_as_an_add_on() {
    let catalog = catalog();
    let now = Timestamp::now();

    let current = provider_subscription("assistant");
    // Moving to a real plan of the same cadence is never a downgrade.
    assert!(!current
        .should_change_at_term_end(&catalog, "collaborator", now)
        .unwrap());

    let request = current.request_for_plan_change("collaborator", 1, false);
    assert_eq!(request.timeframe, ChangeTimeframe::Now);
    assert_eq!(request.plan_code.as_deref(), Some("collaborator"));
    let updates = request.add_on_updates.expect("assistant carried over");
    assert!(updates.iter().any(|u| u.code == AI_ADD_ON_CODE));
}

#[test]
fn term_end_change_only_carries_the_assistant_if_it_survives_the_pending_change() {
    let mut current = provider_subscription("professional");
    current.add_ons = vec![SubscriptionAddOn::new(AI_ADD_ON_CODE, 1, 900)];
    current.pending_change = Some(PendingChange {
        next_plan_code: "professional".to_string(),
        next_add_ons: Vec::new(),
    });

    // Cancellation already pending, so a term-end change must not re-add it.
    let request = current.request_for_plan_change("collaborator", 1, true);
    assert!(request.add_on_updates.is_none());

    // An immediate change sees the add-on as still present.
    let request = current.request_for_plan_change("collaborator", 1, false);
    let updates = request.add_on_updates.expect("assistant present now");
    assert!(updates.iter().any(|u| u.code == AI_ADD_ON_CODE));
}

#[tokio::test]
async fn failed_payment_reverts_to_the_restore_point() {
    let subscriptions = Arc::new(InMemorySubscriptionRepository::default());
    let archive = Arc::new(InMemoryDeletedSubscriptionStore::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let recovery = SubscriptionRecoveryHandler::new(
        Arc::clone(&subscriptions) as _,
        Arc::clone(&archive) as _,
        Arc::clone(&scheduler) as _,
    );

    let mut record = Subscription::new_shell(UserId::new(), Timestamp::now());
    record.plan_code = Some("collaborator".to_string());
    subscriptions.seed(record.clone());

    // Before the upgrade: remember what to go back to.
    recovery
        .set_restore_point(
            &record.id,
            "collaborator",
            vec![SubscriptionAddOn::new(AI_ADD_ON_CODE, 1, 900)],
        )
        .await
        .unwrap();

    // The payment failed: build the revert request from the stored point.
    let stored = subscriptions.by_id(&record.id).unwrap();
    let point = stored.restore_point.expect("restore point present");
    let provider = provider_subscription("professional");
    let request = provider
        .request_for_plan_revert(&catalog(), &point.plan_code, &point.add_ons)
        .unwrap();
    assert_eq!(request.timeframe, ChangeTimeframe::Now);
    assert_eq!(request.plan_code.as_deref(), Some("collaborator"));
    let updates = request.add_on_updates.expect("restore point add-ons");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].code, AI_ADD_ON_CODE);

    // Once the provider accepted the revert, the point is consumed and the
    // reversion counted.
    recovery.consume_restore_point(&record.id).await.unwrap();
    let stored = subscriptions.by_id(&record.id).unwrap();
    assert!(stored.restore_point.is_none());
    assert_eq!(stored.times_reverted_due_to_failed_payment, 1);
}
