//! Background feature-refresh scheduling port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, UserId};

/// Why a feature refresh was requested.
///
/// Carried into the background job and into logs. The external-entitlement-
/// sync reason suppresses the notify-external-systems side effect, since the
/// external system is by definition already up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshReason {
    AddToGroup,
    RemoveFromGroup,
    RemoveFromAllGroups,
    SubscriptionUpdated,
    SubscriptionRestored,
    ExternalEntitlementSync,
    Manual,
}

impl RefreshReason {
    /// Whether this refresh was triggered by an external system reporting
    /// that it is already in sync.
    pub fn is_external_sync(&self) -> bool {
        matches!(self, RefreshReason::ExternalEntitlementSync)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshReason::AddToGroup => "add-to-group",
            RefreshReason::RemoveFromGroup => "remove-from-group",
            RefreshReason::RemoveFromAllGroups => "remove-from-all-groups",
            RefreshReason::SubscriptionUpdated => "subscription-updated",
            RefreshReason::SubscriptionRestored => "subscription-restored",
            RefreshReason::ExternalEntitlementSync => "external-entitlement-sync",
            RefreshReason::Manual => "manual",
        }
    }
}

/// Port for enqueuing fire-and-forget feature refresh jobs.
///
/// Delivery is at-least-once; the refresh itself is idempotent, so duplicate
/// jobs are harmless. Callers treat enqueue failures as best-effort: they
/// are logged, not propagated, because correctness is restored on the next
/// sync or a periodic sweep.
#[async_trait]
pub trait FeatureRefreshScheduler: Send + Sync {
    /// Enqueue a refresh for one user.
    async fn schedule_feature_refresh(
        &self,
        user_id: &UserId,
        reason: RefreshReason,
    ) -> Result<(), DomainError>;
}
