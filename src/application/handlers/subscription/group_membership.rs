//! Group membership operations.
//!
//! Every membership mutation writes an audit entry first and fails closed
//! if the entry cannot be written. Entitlement refreshes and hooks run
//! after the mutation and are best-effort.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, UserId};
use crate::domain::subscription::{RequesterContext, Subscription};
use crate::ports::{
    hooks, AuditEntry, AuditLog, FeatureRefreshScheduler, HookBus, RefreshReason,
    SubscriptionRepository, UserRepository,
};

pub struct GroupMembershipHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
    audit_log: Arc<dyn AuditLog>,
    scheduler: Arc<dyn FeatureRefreshScheduler>,
    hook_bus: Arc<dyn HookBus>,
}

impl GroupMembershipHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        users: Arc<dyn UserRepository>,
        audit_log: Arc<dyn AuditLog>,
        scheduler: Arc<dyn FeatureRefreshScheduler>,
        hook_bus: Arc<dyn HookBus>,
    ) -> Self {
        Self {
            subscriptions,
            users,
            audit_log,
            scheduler,
            hook_bus,
        }
    }

    /// Add a user to a group subscription.
    ///
    /// The membership write is an atomic add-to-set, so adding an existing
    /// member is a no-op rather than a duplicate.
    pub async fn add_user_to_group(
        &self,
        subscription_id: &SubscriptionId,
        user_id: &UserId,
        requester: &RequesterContext,
    ) -> Result<(), DomainError> {
        let subscription = self.load(subscription_id).await?;

        self.audit_log
            .add_entry(
                AuditEntry::new(*user_id, "join-group-subscription")
                    .with_initiator(requester.initiator_id)
                    .with_ip(requester.ip_address.clone())
                    .with_info(json!({ "subscriptionId": subscription_id.to_string() })),
            )
            .await?;

        self.subscriptions
            .add_member(subscription_id, user_id)
            .await?;

        self.schedule_refresh(user_id, RefreshReason::AddToGroup).await;
        self.fire_membership_hook(hooks::GROUP_MEMBER_JOINED, &subscription, user_id)
            .await;
        Ok(())
    }

    /// Remove a user from a group subscription.
    ///
    /// When the group enforces managed-user enrollment, the user's
    /// enrollment fields are cleared in the same operation so they do not
    /// stay bound to a group they are no longer part of.
    pub async fn remove_user_from_group(
        &self,
        subscription_id: &SubscriptionId,
        user_id: &UserId,
        requester: &RequesterContext,
    ) -> Result<(), DomainError> {
        let subscription = self.load(subscription_id).await?;

        self.audit_log
            .add_entry(
                AuditEntry::new(*user_id, "leave-group-subscription")
                    .with_initiator(requester.initiator_id)
                    .with_ip(requester.ip_address.clone())
                    .with_info(json!({ "subscriptionId": subscription_id.to_string() })),
            )
            .await?;

        self.subscriptions
            .remove_member(subscription_id, user_id)
            .await?;
        if subscription.managed_users_enabled {
            self.users.clear_managed_enrollment(user_id).await?;
        }

        self.schedule_refresh(user_id, RefreshReason::RemoveFromGroup)
            .await;
        self.fire_membership_hook(hooks::GROUP_MEMBER_LEFT, &subscription, user_id)
            .await;
        Ok(())
    }

    /// Remove a user from every group they belong to (account deletion).
    pub async fn remove_user_from_all_groups(
        &self,
        user_id: &UserId,
        requester: &RequesterContext,
    ) -> Result<(), DomainError> {
        let memberships = self.subscriptions.find_member_subscriptions(user_id).await?;
        if memberships.is_empty() {
            return Ok(());
        }

        // One entry per subscription, matching the single-group removal
        // path so the audit trail stays queryable per subscription.
        for subscription in &memberships {
            self.audit_log
                .add_entry(
                    AuditEntry::new(*user_id, "leave-group-subscription")
                        .with_initiator(requester.initiator_id)
                        .with_ip(requester.ip_address.clone())
                        .with_info(json!({ "subscriptionId": subscription.id.to_string() })),
                )
                .await?;
        }

        for subscription in &memberships {
            self.subscriptions
                .remove_member(&subscription.id, user_id)
                .await?;
            if subscription.managed_users_enabled {
                self.users.clear_managed_enrollment(user_id).await?;
            }
        }

        self.schedule_refresh(user_id, RefreshReason::RemoveFromAllGroups)
            .await;
        for subscription in &memberships {
            self.fire_membership_hook(hooks::GROUP_MEMBER_LEFT, subscription, user_id)
                .await;
        }
        Ok(())
    }

    /// Transfer ownership of a subscription to another user.
    ///
    /// On group plans the new admin joins the manager set; on individual
    /// plans the manager set is replaced outright, since its only member is
    /// the admin.
    pub async fn update_admin(
        &self,
        subscription_id: &SubscriptionId,
        new_admin_id: &UserId,
    ) -> Result<(), DomainError> {
        let subscription = self.load(subscription_id).await?;
        self.subscriptions
            .set_admin(subscription_id, new_admin_id, !subscription.group_plan)
            .await
    }

    async fn load(&self, subscription_id: &SubscriptionId) -> Result<Subscription, DomainError> {
        self.subscriptions
            .find_by_id(subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "subscription not found")
                    .with_detail("subscription_id", subscription_id.to_string())
            })
    }

    async fn schedule_refresh(&self, user_id: &UserId, reason: RefreshReason) {
        if let Err(err) = self.scheduler.schedule_feature_refresh(user_id, reason).await {
            warn!(user_id = %user_id, error = %err, "failed to schedule feature refresh");
        }
    }

    async fn fire_membership_hook(
        &self,
        hook: &str,
        subscription: &Subscription,
        user_id: &UserId,
    ) {
        let results = self
            .hook_bus
            .fire(
                hook,
                json!({
                    "userId": user_id.to_string(),
                    "subscriptionId": subscription.id.to_string(),
                }),
            )
            .await;
        for result in results.iter().filter(|r| r.is_err()) {
            warn!(user_id = %user_id, hook, ?result, "membership hook failed");
        }
    }
}
