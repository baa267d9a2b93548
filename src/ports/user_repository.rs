//! User entitlement record port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::features::{FeatureOverride, FeatureSet};
use crate::domain::foundation::{DomainError, SubscriptionId, UserId};

/// The slice of a user record the entitlement core reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,

    /// The last persisted effective entitlement.
    pub features: FeatureSet,

    /// Time-limited manual grants.
    pub feature_overrides: Vec<FeatureOverride>,

    /// How many users this one referred; drives the bonus tiers.
    pub referred_user_count: u32,

    /// Whether the user has an active SSO-based entitlement linkage.
    pub sso_linked: bool,

    /// Group subscription enforcing managed-user enrollment, if any.
    pub managed_by: Option<SubscriptionId>,
}

impl UserRecord {
    /// A fresh record with no entitlement beyond the baseline.
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            features: FeatureSet::new(),
            feature_overrides: Vec::new(),
            referred_user_count: 0,
            sso_linked: false,
            managed_by: None,
        }
    }
}

/// Repository port for user entitlement records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load a user record. Returns `None` if the user does not exist.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, DomainError>;

    /// Persist the effective entitlement atomically.
    async fn set_features(&self, id: &UserId, features: &FeatureSet) -> Result<(), DomainError>;

    /// Unset the managed-user enrollment fields (conditional update).
    async fn clear_managed_enrollment(&self, id: &UserId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn UserRepository) {}
    }

    #[test]
    fn new_record_has_no_entitlement() {
        let record = UserRecord::new(UserId::new());
        assert!(record.features.is_empty());
        assert!(record.feature_overrides.is_empty());
        assert!(!record.sso_linked);
    }
}
