//! Failed-payment restore points and archive restoration.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::domain::payment::SubscriptionAddOn;
use crate::domain::subscription::RestorePoint;
use crate::ports::{
    DeletedSubscriptionStore, FeatureRefreshScheduler, RefreshReason, SubscriptionRepository,
};

pub struct SubscriptionRecoveryHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    archive: Arc<dyn DeletedSubscriptionStore>,
    scheduler: Arc<dyn FeatureRefreshScheduler>,
}

impl SubscriptionRecoveryHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        archive: Arc<dyn DeletedSubscriptionStore>,
        scheduler: Arc<dyn FeatureRefreshScheduler>,
    ) -> Self {
        Self {
            subscriptions,
            archive,
            scheduler,
        }
    }

    /// Record the plan and add-ons to revert to if an upcoming payment
    /// fails. Written before the provider change is requested.
    pub async fn set_restore_point(
        &self,
        subscription_id: &SubscriptionId,
        plan_code: impl Into<String>,
        add_ons: Vec<SubscriptionAddOn>,
    ) -> Result<(), DomainError> {
        self.subscriptions
            .set_restore_point(
                subscription_id,
                Some(RestorePoint {
                    plan_code: plan_code.into(),
                    add_ons,
                }),
                false,
            )
            .await
    }

    /// Clear the restore point after reverting to it, counting the
    /// reversion against the subscription.
    pub async fn consume_restore_point(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<(), DomainError> {
        self.subscriptions
            .set_restore_point(subscription_id, None, true)
            .await
    }

    /// Clear the restore point without a reversion (the payment went
    /// through, nothing to revert to anymore).
    pub async fn void_restore_point(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<(), DomainError> {
        self.subscriptions
            .set_restore_point(subscription_id, None, false)
            .await
    }

    /// Bring an archived subscription back as the live record.
    ///
    /// Refreshes are scheduled before the archive entry is removed, and a
    /// scheduling failure aborts the restore. The archive entry then still
    /// exists, so the whole operation can be retried.
    pub async fn restore_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<(), DomainError> {
        let deleted = self
            .archive
            .find_by_subscription_id(subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    "no archived subscription to restore",
                )
                .with_detail("subscription_id", subscription_id.to_string())
            })?;

        self.subscriptions.save(&deleted.subscription).await?;
        for user_id in deleted.subscription.affected_user_ids() {
            self.scheduler
                .schedule_feature_refresh(&user_id, RefreshReason::SubscriptionRestored)
                .await?;
        }
        self.archive.remove(subscription_id).await?;
        info!(subscription_id = %subscription_id, "restored archived subscription");
        Ok(())
    }
}
