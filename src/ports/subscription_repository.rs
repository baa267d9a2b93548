//! Subscription repository port.
//!
//! Defines the contract for persisting canonical subscription records. The
//! backing store is assumed to be an atomic document store: membership
//! mutations use set-semantics updates (add-to-set / pull) so concurrent
//! changes from different requests do not corrupt the member list.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId, UserId};
use crate::domain::subscription::{RestorePoint, Subscription};

/// Repository port for canonical subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription owned by an admin user.
    ///
    /// Returns `None` if the admin has no subscription.
    async fn find_by_admin(&self, admin_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    /// Find a subscription by its id.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Find every group subscription the user is a member of.
    async fn find_member_subscriptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Subscription>, DomainError>;

    /// Insert a new record.
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Persist the full record, replacing the stored version.
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Remove the live record (used together with the archive store).
    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError>;

    /// Atomic add-to-set on `member_ids`.
    async fn add_member(&self, id: &SubscriptionId, user_id: &UserId)
        -> Result<(), DomainError>;

    /// Atomic pull on `member_ids`.
    async fn remove_member(
        &self,
        id: &SubscriptionId,
        user_id: &UserId,
    ) -> Result<(), DomainError>;

    /// Atomic admin change: sets the admin and either adds them to the
    /// manager set (group plans) or replaces the manager set entirely
    /// (individual plans).
    async fn set_admin(
        &self,
        id: &SubscriptionId,
        admin_id: &UserId,
        replace_managers: bool,
    ) -> Result<(), DomainError>;

    /// Conditional update of the restore point. When `consumed` is set the
    /// reverted-due-to-failed-payment counter is incremented in the same
    /// update.
    async fn set_restore_point(
        &self,
        id: &SubscriptionId,
        restore_point: Option<RestorePoint>,
        consumed: bool,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
