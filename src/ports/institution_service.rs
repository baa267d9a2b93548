//! Institutional licensing lookup port.

use async_trait::async_trait;

use crate::domain::features::FeatureSet;
use crate::domain::foundation::{DomainError, UserId};

/// Port for institutional entitlement lookups.
///
/// A user affiliated with a licensed institution inherits that license's
/// features. Implementations return an empty set when the user has no
/// qualifying affiliation.
#[async_trait]
pub trait InstitutionService: Send + Sync {
    /// Features granted through institutional licensing, empty if none.
    async fn entitlement_for(&self, user_id: &UserId) -> Result<FeatureSet, DomainError>;
}
