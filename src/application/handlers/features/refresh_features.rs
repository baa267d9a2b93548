//! Recompute and persist a user's effective entitlement.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::config::Settings;
use crate::domain::features::FeatureSet;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{hooks, HookBus, RefreshReason, UserRecord, UserRepository};

use super::sources::FeatureSources;

/// Integrations revoked when the matching capability regresses.
const WATCHED_INTEGRATIONS: &[(&str, &str)] =
    &[("dropbox", hooks::UNLINK_DROPBOX), ("github", hooks::UNLINK_GITHUB)];

/// Result of a refresh: the new effective entitlement and whether it
/// differs from what was stored before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub features: FeatureSet,
    pub changed: bool,
}

/// Recomputes a user's effective entitlement from every source and writes
/// it back to the user record.
///
/// The computation is a pure fold over the source grants, so running it
/// twice against unchanged sources persists the same value. Side effects
/// (unlink hooks, external notification) fire only when the persisted
/// value actually changed.
pub struct RefreshFeaturesHandler {
    sources: FeatureSources,
    settings: Arc<Settings>,
    users: Arc<dyn UserRepository>,
    hook_bus: Arc<dyn HookBus>,
}

impl RefreshFeaturesHandler {
    pub fn new(
        sources: FeatureSources,
        settings: Arc<Settings>,
        users: Arc<dyn UserRepository>,
        hook_bus: Arc<dyn HookBus>,
    ) -> Self {
        Self {
            sources,
            settings,
            users,
            hook_bus,
        }
    }

    /// Compute the effective entitlement without persisting it.
    pub async fn compute_features(&self, user_id: &UserId) -> Result<FeatureSet, DomainError> {
        let user = self.load_user(user_id).await?;
        self.compute_for(&user).await
    }

    /// Recompute, persist, and fire change side effects.
    pub async fn refresh_features(
        &self,
        user_id: &UserId,
        reason: RefreshReason,
    ) -> Result<RefreshOutcome, DomainError> {
        let user = self.load_user(user_id).await?;
        let features = self.compute_for(&user).await?;
        let changed = features != user.features;
        self.users.set_features(user_id, &features).await?;

        if changed {
            self.unlink_regressed_integrations(user_id, &user.features, &features)
                .await;
            if !reason.is_external_sync() {
                self.notify_entitlement_changed(user_id, &features).await;
            }
        }

        info!(
            user_id = %user_id,
            reason = reason.as_str(),
            changed,
            "refreshed user features"
        );
        Ok(RefreshOutcome { features, changed })
    }

    async fn load_user(&self, user_id: &UserId) -> Result<UserRecord, DomainError> {
        self.users.find_by_id(user_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::UserNotFound, "user not found")
                .with_detail("user_id", user_id.to_string())
        })
    }

    /// Fold of baseline + the seven source grants, with the references
    /// back-fill applied once at the end.
    async fn compute_for(&self, user: &UserRecord) -> Result<FeatureSet, DomainError> {
        let now = Timestamp::now();
        let (individual, group, institution, legacy) = futures::try_join!(
            self.sources.individual_features(&user.id),
            self.sources.group_features(&user.id),
            self.sources.institution_features(&user.id),
            self.sources.legacy_features(&user.id),
        )?;

        let merged = [
            individual,
            group,
            institution,
            legacy,
            self.sources.bonus_features(user),
            self.sources.override_features(user, now),
            self.sources.sso_features(user),
        ]
        .iter()
        .fold(self.settings.default_features.clone(), |acc, grant| {
            acc.merge(grant)
        });

        Ok(merged.with_references_backfill())
    }

    /// Fire unlink hooks for integrations whose capability regressed.
    /// Hook failures are logged, never propagated: the entitlement change
    /// has already been persisted and must stand.
    async fn unlink_regressed_integrations(
        &self,
        user_id: &UserId,
        before: &FeatureSet,
        after: &FeatureSet,
    ) {
        for (capability, hook) in WATCHED_INTEGRATIONS {
            if before.enabled(capability) && !after.enabled(capability) {
                let results = self
                    .hook_bus
                    .fire(hook, json!({ "userId": user_id.to_string() }))
                    .await;
                for result in results.iter().filter(|r| r.is_err()) {
                    warn!(user_id = %user_id, hook, ?result, "unlink hook failed");
                }
            }
        }
    }

    async fn notify_entitlement_changed(&self, user_id: &UserId, features: &FeatureSet) {
        let results = self
            .hook_bus
            .fire(
                hooks::ENTITLEMENT_CHANGED,
                json!({ "userId": user_id.to_string(), "features": features }),
            )
            .await;
        for result in results.iter().filter(|r| r.is_err()) {
            warn!(user_id = %user_id, ?result, "entitlement-changed hook failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::hooks::HookRegistry;
    use crate::adapters::memory::{
        InMemoryInstitutionService, InMemoryLegacyPlatform, InMemorySubscriptionRepository,
        InMemoryUserRepository,
    };
    use crate::domain::features::{FeatureOverride, FeatureValue};
    use crate::domain::plans::PlanCatalog;

    fn handler_with(
        settings: Settings,
        users: Arc<InMemoryUserRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        legacy: Arc<InMemoryLegacyPlatform>,
        hook_bus: Arc<dyn HookBus>,
    ) -> RefreshFeaturesHandler {
        let settings = Arc::new(settings);
        let sources = FeatureSources::new(
            Arc::clone(&settings),
            subscriptions,
            Arc::new(InMemoryInstitutionService::default()),
            legacy,
        );
        RefreshFeaturesHandler::new(sources, settings, users, hook_bus)
    }

    fn plain_settings(default_features: FeatureSet) -> Settings {
        Settings {
            default_features,
            referral_bonus: Default::default(),
            sso_features: FeatureSet::new(),
            plan_catalog: PlanCatalog::new([]),
        }
    }

    #[tokio::test]
    async fn baseline_applies_when_no_source_grants_anything() {
        let users = Arc::new(InMemoryUserRepository::default());
        let user_id = UserId::new();
        users.seed(UserRecord::new(user_id));

        let handler = handler_with(
            plain_settings(FeatureSet::new().with("collaborators", 1i64)),
            Arc::clone(&users),
            Arc::new(InMemorySubscriptionRepository::default()),
            Arc::new(InMemoryLegacyPlatform::default()),
            Arc::new(HookRegistry::new()),
        );

        let outcome = handler
            .refresh_features(&user_id, RefreshReason::Manual)
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(
            outcome.features.get("collaborators"),
            Some(&FeatureValue::Count(1))
        );
        assert_eq!(users.features_of(&user_id), Some(outcome.features));
    }

    #[tokio::test]
    async fn refresh_is_idempotent_against_unchanged_sources() {
        let users = Arc::new(InMemoryUserRepository::default());
        let user_id = UserId::new();
        users.seed(UserRecord::new(user_id));

        let handler = handler_with(
            plain_settings(FeatureSet::new().with("compileTimeout", 60i64)),
            Arc::clone(&users),
            Arc::new(InMemorySubscriptionRepository::default()),
            Arc::new(InMemoryLegacyPlatform::default()),
            Arc::new(HookRegistry::new()),
        );

        let first = handler
            .refresh_features(&user_id, RefreshReason::Manual)
            .await
            .unwrap();
        assert!(first.changed);
        let second = handler
            .refresh_features(&user_id, RefreshReason::Manual)
            .await
            .unwrap();
        assert!(!second.changed);
        assert_eq!(first.features, second.features);
    }

    #[tokio::test]
    async fn overrides_and_legacy_grants_are_merged_in() {
        let users = Arc::new(InMemoryUserRepository::default());
        let user_id = UserId::new();
        let mut record = UserRecord::new(user_id);
        record.feature_overrides = vec![FeatureOverride {
            features: FeatureSet::new().with("compileTimeout", 3600i64),
            expires_at: Some(Timestamp::now().add_days(7)),
        }];
        users.seed(record);

        let legacy = Arc::new(InMemoryLegacyPlatform::default());
        legacy.grant(user_id, FeatureSet::new().with("gitBridge", true));

        let handler = handler_with(
            plain_settings(FeatureSet::new().with("compileTimeout", 60i64)),
            Arc::clone(&users),
            Arc::new(InMemorySubscriptionRepository::default()),
            legacy,
            Arc::new(HookRegistry::new()),
        );

        let outcome = handler
            .refresh_features(&user_id, RefreshReason::Manual)
            .await
            .unwrap();
        assert_eq!(
            outcome.features.get("compileTimeout"),
            Some(&FeatureValue::Count(3600))
        );
        assert!(outcome.features.enabled("gitBridge"));
    }

    #[tokio::test]
    async fn legacy_platform_failure_is_fatal() {
        let users = Arc::new(InMemoryUserRepository::default());
        let user_id = UserId::new();
        users.seed(UserRecord::new(user_id));

        let legacy = Arc::new(InMemoryLegacyPlatform::default());
        legacy.fail_with(DomainError::new(
            ErrorCode::ExternalServiceError,
            "legacy platform timeout",
        ));

        let handler = handler_with(
            plain_settings(FeatureSet::new()),
            Arc::clone(&users),
            Arc::new(InMemorySubscriptionRepository::default()),
            legacy,
            Arc::new(HookRegistry::new()),
        );

        let err = handler
            .refresh_features(&user_id, RefreshReason::Manual)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        assert_eq!(users.features_of(&user_id), Some(FeatureSet::new()));
    }

    #[tokio::test]
    async fn dropbox_regression_fires_the_unlink_hook() {
        let users = Arc::new(InMemoryUserRepository::default());
        let user_id = UserId::new();
        let mut record = UserRecord::new(user_id);
        record.features = FeatureSet::new().with("dropbox", true);
        users.seed(record);

        let hook_bus = Arc::new(HookRegistry::new());
        let fired = hook_bus.recorder();

        let handler = handler_with(
            plain_settings(FeatureSet::new().with("dropbox", false)),
            Arc::clone(&users),
            Arc::new(InMemorySubscriptionRepository::default()),
            Arc::new(InMemoryLegacyPlatform::default()),
            hook_bus,
        );

        handler
            .refresh_features(&user_id, RefreshReason::Manual)
            .await
            .unwrap();
        let fired = fired.lock().unwrap();
        assert!(fired.iter().any(|(name, _)| name == hooks::UNLINK_DROPBOX));
        assert!(!fired.iter().any(|(name, _)| name == hooks::UNLINK_GITHUB));
    }

    #[tokio::test]
    async fn failing_hook_handlers_do_not_fail_the_refresh() {
        let users = Arc::new(InMemoryUserRepository::default());
        let user_id = UserId::new();
        let mut record = UserRecord::new(user_id);
        record.features = FeatureSet::new().with("dropbox", true);
        users.seed(record);

        let hook_bus = Arc::new(HookRegistry::new());
        hook_bus.register(hooks::UNLINK_DROPBOX, |_| Err("unlink failed".to_string()));
        hook_bus.register(hooks::ENTITLEMENT_CHANGED, |_| {
            Err("notify failed".to_string())
        });

        let handler = handler_with(
            plain_settings(FeatureSet::new().with("dropbox", false)),
            Arc::clone(&users),
            Arc::new(InMemorySubscriptionRepository::default()),
            Arc::new(InMemoryLegacyPlatform::default()),
            hook_bus,
        );

        // The regression fires both hooks; their failures are logged, and
        // the new entitlement still lands on the record.
        let outcome = handler
            .refresh_features(&user_id, RefreshReason::Manual)
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(users.features_of(&user_id), Some(outcome.features));
    }

    #[tokio::test]
    async fn external_sync_suppresses_the_entitlement_changed_hook() {
        let users = Arc::new(InMemoryUserRepository::default());
        let user_id = UserId::new();
        users.seed(UserRecord::new(user_id));

        let hook_bus = Arc::new(HookRegistry::new());
        let fired = hook_bus.recorder();

        let handler = handler_with(
            plain_settings(FeatureSet::new().with("gitBridge", true)),
            Arc::clone(&users),
            Arc::new(InMemorySubscriptionRepository::default()),
            Arc::new(InMemoryLegacyPlatform::default()),
            hook_bus,
        );

        handler
            .refresh_features(&user_id, RefreshReason::ExternalEntitlementSync)
            .await
            .unwrap();
        assert!(fired.lock().unwrap().is_empty());
    }
}
