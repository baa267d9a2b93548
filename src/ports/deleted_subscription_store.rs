//! Archive store for logically deleted subscriptions.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::DeletedSubscription;

/// Port for the deleted-subscription archive.
///
/// Records move here instead of being hard-removed, so a subscription can
/// be inspected or restored after the provider reported it expired.
#[async_trait]
pub trait DeletedSubscriptionStore: Send + Sync {
    /// Upsert an archive entry keyed by the original subscription id.
    async fn archive(&self, deleted: &DeletedSubscription) -> Result<(), DomainError>;

    /// Look up an archive entry by the original subscription id.
    async fn find_by_subscription_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<DeletedSubscription>, DomainError>;

    /// Remove an archive entry (after a successful restore).
    async fn remove(&self, id: &SubscriptionId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_subscription_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn DeletedSubscriptionStore) {}
    }
}
