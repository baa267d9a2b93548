//! The seven entitlement sources.
//!
//! Each collector returns the features one source grants a user, or an
//! empty set when the source does not apply. Collectors never partially
//! apply a source: a read failure on a source that gates correctness is
//! propagated instead of silently degraded to `{}`.

use std::sync::Arc;

use tracing::warn;

use crate::config::Settings;
use crate::domain::features::{FeatureOverride, FeatureSet};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{InstitutionService, LegacyPlatformClient, SubscriptionRepository, UserRecord};

/// Collects the per-source feature grants for a user.
pub struct FeatureSources {
    settings: Arc<Settings>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    institutions: Arc<dyn InstitutionService>,
    legacy_platform: Arc<dyn LegacyPlatformClient>,
}

impl FeatureSources {
    pub fn new(
        settings: Arc<Settings>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        institutions: Arc<dyn InstitutionService>,
        legacy_platform: Arc<dyn LegacyPlatformClient>,
    ) -> Self {
        Self {
            settings,
            subscriptions,
            institutions,
            legacy_platform,
        }
    }

    /// Features from the subscription the user administers.
    ///
    /// Group plans grant nothing here: the admin is seeded as a member of
    /// their own group and picks the features up through the membership
    /// collector instead. Add-on features apply either way.
    pub async fn individual_features(&self, user_id: &UserId) -> Result<FeatureSet, DomainError> {
        let Some(subscription) = self.subscriptions.find_by_admin(user_id).await? else {
            return Ok(FeatureSet::new());
        };
        let contributes = subscription
            .provider_status
            .as_ref()
            .is_some_and(|status| status.state.contributes_features());
        if !contributes {
            return Ok(FeatureSet::new());
        }
        let Some(plan_code) = subscription.plan_code.as_deref() else {
            return Ok(FeatureSet::new());
        };

        let catalog = &self.settings.plan_catalog;
        let mut features = match catalog.find_plan(plan_code) {
            Some(plan) if !plan.group_plan => plan.features.clone(),
            Some(_) => FeatureSet::new(),
            None => {
                // Stored plan codes are validated at sync time, so this is
                // stale catalog data. Grant nothing rather than guess.
                warn!(user_id = %user_id, plan_code, "stored plan code missing from catalog");
                FeatureSet::new()
            }
        };
        for add_on in &subscription.add_ons {
            features = features.merge(&catalog.add_on_features(&add_on.code));
        }
        Ok(features)
    }

    /// Features from every group subscription the user is a member of.
    pub async fn group_features(&self, user_id: &UserId) -> Result<FeatureSet, DomainError> {
        let memberships = self.subscriptions.find_member_subscriptions(user_id).await?;
        let catalog = &self.settings.plan_catalog;
        let mut features = FeatureSet::new();
        for subscription in &memberships {
            if subscription.member_features_disabled {
                continue;
            }
            let Some(plan_code) = subscription.plan_code.as_deref() else {
                continue;
            };
            match catalog.find_plan(plan_code) {
                Some(plan) => features = features.merge(&plan.features),
                None => {
                    warn!(
                        subscription_id = %subscription.id,
                        plan_code,
                        "group plan code missing from catalog"
                    );
                }
            }
        }
        Ok(features)
    }

    /// Features from institutional licensing.
    pub async fn institution_features(&self, user_id: &UserId) -> Result<FeatureSet, DomainError> {
        self.institutions.entitlement_for(user_id).await
    }

    /// Grandfathered features from the legacy platform.
    ///
    /// "User unknown there" is the only condition that degrades to `{}`;
    /// any other failure propagates so a stale upstream cannot cause a
    /// wrong entitlement to be persisted.
    pub async fn legacy_features(&self, user_id: &UserId) -> Result<FeatureSet, DomainError> {
        Ok(self
            .legacy_platform
            .grandfathered_features(user_id)
            .await?
            .unwrap_or_default())
    }

    /// Referral bonus tier for the user's referred count.
    pub fn bonus_features(&self, user: &UserRecord) -> FeatureSet {
        self.settings.bonus_features_for(user.referred_user_count)
    }

    /// Merge of the user's unexpired manual overrides.
    pub fn override_features(&self, user: &UserRecord, now: Timestamp) -> FeatureSet {
        FeatureOverride::merge_active(&user.feature_overrides, now)
    }

    /// SSO-linked entitlement, a fixed set from configuration.
    pub fn sso_features(&self, user: &UserRecord) -> FeatureSet {
        if user.sso_linked {
            self.settings.sso_features.clone()
        } else {
            FeatureSet::new()
        }
    }
}
