//! Synchronize the canonical subscription record from a provider snapshot.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::payment::ProviderSubscription;
use crate::domain::subscription::{DeletedSubscription, RequesterContext, Subscription};
use crate::ports::{
    DeletedSubscriptionStore, FeatureRefreshScheduler, RefreshReason, SubscriptionRepository,
};

/// Applies provider subscription snapshots to the canonical store.
///
/// The flow is read, transform in memory, write once. The snapshot is
/// treated as authoritative for everything the provider owns (plan, state,
/// add-ons, trial window); locally owned group state is never touched.
pub struct SyncSubscriptionHandler {
    settings: Arc<Settings>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    archive: Arc<dyn DeletedSubscriptionStore>,
    scheduler: Arc<dyn FeatureRefreshScheduler>,
}

impl SyncSubscriptionHandler {
    pub fn new(
        settings: Arc<Settings>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        archive: Arc<dyn DeletedSubscriptionStore>,
        scheduler: Arc<dyn FeatureRefreshScheduler>,
    ) -> Self {
        Self {
            settings,
            subscriptions,
            archive,
            scheduler,
        }
    }

    /// Sync one provider snapshot for the given admin user.
    ///
    /// Creates the subscription shell if the admin has none yet, so provider
    /// events can arrive before any local record exists.
    ///
    /// # Errors
    ///
    /// An unknown plan code is a configuration error and fails the sync so
    /// the event source can retry after the catalog is fixed. Store failures
    /// propagate as-is.
    pub async fn sync(
        &self,
        snapshot: &ProviderSubscription,
        admin_id: &UserId,
        requester: &RequesterContext,
    ) -> Result<(), DomainError> {
        let now = Timestamp::now();
        let record = match self.subscriptions.find_by_admin(admin_id).await? {
            Some(existing) => existing,
            None => {
                let shell = Subscription::new_shell(*admin_id, now);
                self.subscriptions.insert(&shell).await?;
                shell
            }
        };

        if snapshot.state.is_expired() {
            return self.handle_expired(record, requester, now).await;
        }

        let catalog = &self.settings.plan_catalog;
        let plan = catalog.find_plan(&snapshot.plan_code).ok_or_else(|| {
            DomainError::new(ErrorCode::UnknownPlanCode, "plan code not found in catalog")
                .with_detail("plan_code", snapshot.plan_code.clone())
        })?;

        // A plan-type flip (group <-> individual) is a change of identity,
        // not an update: the old record is archived and a fresh shell takes
        // its place so group state never leaks across the boundary.
        let mut record = if record.plan_code.is_some() && record.group_plan != plan.group_plan {
            info!(
                subscription_id = %record.id,
                from_group = record.group_plan,
                to_group = plan.group_plan,
                "plan type changed, replacing subscription record"
            );
            self.delete_subscription(&record, requester, now).await?;
            let shell = Subscription::new_shell(record.admin_id, now);
            self.subscriptions.insert(&shell).await?;
            shell
        } else {
            record
        };

        record.apply_snapshot(snapshot, plan, now);
        self.subscriptions.save(&record).await?;
        self.schedule_refresh(&record).await;
        Ok(())
    }

    /// The provider reported the subscription expired.
    ///
    /// Protected records (managed users, group SSO) are kept in place so a
    /// payment lapse cannot break enterprise control-plane features; the
    /// record is left for an operator to resolve.
    async fn handle_expired(
        &self,
        record: Subscription,
        requester: &RequesterContext,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if record.has_deletion_protection() {
            warn!(
                subscription_id = %record.id,
                managed_users = record.managed_users_enabled,
                group_sso = record.group_sso_enabled,
                "expired subscription is protected, keeping record"
            );
            return Ok(());
        }
        self.delete_subscription(&record, requester, now).await?;
        Ok(())
    }

    /// Archive-then-delete, with entitlement refreshes for everyone who
    /// just lost the record. Archiving first means a crash between the two
    /// writes leaves a restorable copy, never a lost one.
    async fn delete_subscription(
        &self,
        record: &Subscription,
        requester: &RequesterContext,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.archive
            .archive(&DeletedSubscription {
                subscription: record.clone(),
                deleter: requester.clone(),
                deleted_at: now,
            })
            .await?;
        self.subscriptions.delete(&record.id).await?;
        self.schedule_refresh(record).await;
        Ok(())
    }

    /// Best-effort refresh scheduling for every affected user. Failures are
    /// logged and swallowed; the next sync or a periodic sweep repairs any
    /// missed refresh.
    async fn schedule_refresh(&self, record: &Subscription) {
        for user_id in record.affected_user_ids() {
            if let Err(err) = self
                .scheduler
                .schedule_feature_refresh(&user_id, RefreshReason::SubscriptionUpdated)
                .await
            {
                warn!(user_id = %user_id, error = %err, "failed to schedule feature refresh");
            }
        }
    }
}
