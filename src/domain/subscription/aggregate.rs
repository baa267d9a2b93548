//! Subscription aggregate entity.
//!
//! # Design Decisions
//!
//! - **One per admin user**: the record is looked up and upserted by admin id.
//! - **Money in cents**: all monetary values are i64 cents.
//! - **Read, transform, write**: [`Subscription::apply_snapshot`] is a pure
//!   transform over an owned record; the store sees exactly one write after
//!   all derived fields are computed.
//! - **Logical deletion**: expired subscriptions move to a deleted-
//!   subscription archive rather than being hard-removed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};
use crate::domain::payment::{ProviderState, ProviderSubscription, SubscriptionAddOn};
use crate::domain::plans::PlanDefinition;

/// Mirror of the provider's lifecycle state on the canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub state: ProviderState,
    pub trial_started_at: Option<Timestamp>,
    pub trial_ends_at: Option<Timestamp>,
}

/// Last known-good plan/add-on configuration, kept for rollback after a
/// failed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorePoint {
    pub plan_code: String,
    pub add_ons: Vec<SubscriptionAddOn>,
}

/// Who initiated an operation, carried into archive records and audit logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterContext {
    pub initiator_id: Option<UserId>,
    pub ip_address: Option<String>,
}

/// Canonical subscription record for one admin user.
///
/// # Invariants
///
/// - A group-plan record's `member_ids` includes the admin.
/// - `members_limit` is the base plan limit plus any seat add-on quantity.
/// - Group and individual records are never hybridized: a plan-type
///   transition archives the old record and starts from a fresh shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,

    /// Admin (owner) of this subscription.
    pub admin_id: UserId,

    /// Members entitled through this subscription (group plans only).
    pub member_ids: BTreeSet<UserId>,

    /// Users allowed to manage this subscription.
    pub manager_ids: BTreeSet<UserId>,

    /// Current plan code, `None` for a freshly created shell.
    pub plan_code: Option<String>,

    pub group_plan: bool,

    /// Seat limit for group plans: base plan limit plus seat add-ons.
    pub members_limit: i64,

    pub add_ons: Vec<SubscriptionAddOn>,

    /// Provider-side subscription id, once known.
    pub provider_subscription_id: Option<String>,

    /// Mirror of the provider's lifecycle state.
    pub provider_status: Option<ProviderStatus>,

    /// Managed-user enforcement. Protects the record from deletion on
    /// payment lapse.
    pub managed_users_enabled: bool,

    /// Group SSO enforcement. Same protection as managed users.
    pub group_sso_enabled: bool,

    /// When set, members no longer inherit this group's plan features.
    pub member_features_disabled: bool,

    pub restore_point: Option<RestorePoint>,

    /// How often the restore point was consumed after a failed payment.
    pub times_reverted_due_to_failed_payment: u32,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates an empty shell for an admin user.
    ///
    /// The shell is the idempotent starting point the first time a provider
    /// event needs a home for this admin; the snapshot is applied on top.
    pub fn new_shell(admin_id: UserId, now: Timestamp) -> Self {
        Self {
            id: SubscriptionId::new(),
            admin_id,
            member_ids: BTreeSet::new(),
            manager_ids: BTreeSet::from([admin_id]),
            plan_code: None,
            group_plan: false,
            members_limit: 0,
            add_ons: Vec::new(),
            provider_subscription_id: None,
            provider_status: None,
            managed_users_enabled: false,
            group_sso_enabled: false,
            member_features_disabled: false,
            restore_point: None,
            times_reverted_due_to_failed_payment: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Every user whose entitlement depends on this record.
    pub fn affected_user_ids(&self) -> Vec<UserId> {
        let mut ids = vec![self.admin_id];
        ids.extend(self.member_ids.iter().copied().filter(|id| *id != self.admin_id));
        ids
    }

    /// Whether payment lapse must not destroy this record.
    ///
    /// Managed-user enforcement and group SSO are control-plane features; a
    /// lapsed payment must not silently break them.
    pub fn has_deletion_protection(&self) -> bool {
        self.managed_users_enabled || self.group_sso_enabled
    }

    /// Applies a provider snapshot onto this record.
    ///
    /// Pure transform: no I/O, the caller persists the result exactly once.
    /// Re-applying the same snapshot with the same `now` yields an identical
    /// record.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &ProviderSubscription,
        plan: &PlanDefinition,
        now: Timestamp,
    ) {
        self.provider_subscription_id = Some(snapshot.id.clone());
        self.plan_code = Some(snapshot.plan_code.clone());
        self.add_ons = snapshot.add_ons.clone();
        self.provider_status = Some(ProviderStatus {
            state: snapshot.state,
            trial_started_at: snapshot.trial_start,
            trial_ends_at: snapshot.trial_end,
        });

        if plan.group_plan {
            if !self.group_plan {
                // The admin becomes the group's first member.
                self.member_ids.insert(self.admin_id);
            }
            self.group_plan = true;
            self.members_limit = plan.members_limit;

            // Some plans allow more seats than the base plan provides,
            // recorded as an add-on on the subscription.
            if let Some(seat_add_on) = &plan.members_limit_add_on {
                for add_on in &snapshot.add_ons {
                    if add_on.code == *seat_add_on {
                        self.members_limit += i64::from(add_on.quantity);
                    }
                }
            }
        }

        self.updated_at = now;
    }
}

/// Archive entry for a logically deleted subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedSubscription {
    pub subscription: Subscription,
    pub deleter: RequesterContext,
    pub deleted_at: Timestamp,
}
