//! Legacy platform client port.

use async_trait::async_trait;

use crate::domain::features::FeatureSet;
use crate::domain::foundation::{DomainError, UserId};

/// Port for grandfathered entitlement lookups on the legacy platform.
///
/// Implementations must map the platform's "user not found" condition to
/// `Ok(None)` - that is the only condition that degrades to no entitlement.
/// Any other failure (timeout, auth, malformed response) must surface as an
/// error, since it may mean the source data is stale or wrong and resolving
/// features against it would persist a wrong entitlement.
#[async_trait]
pub trait LegacyPlatformClient: Send + Sync {
    /// Grandfathered plan features, `None` when the user is unknown there.
    async fn grandfathered_features(
        &self,
        user_id: &UserId,
    ) -> Result<Option<FeatureSet>, DomainError>;
}
