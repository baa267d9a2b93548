//! In-memory subscription store and archive.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, UserId};
use crate::domain::subscription::{DeletedSubscription, RestorePoint, Subscription};
use crate::ports::{DeletedSubscriptionStore, SubscriptionRepository};

/// In-memory subscription repository.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    records: Mutex<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionRepository {
    /// Insert or replace a record directly, bypassing the port.
    pub fn seed(&self, subscription: Subscription) {
        self.lock().insert(subscription.id, subscription);
    }

    /// Direct lookup by admin for assertions.
    pub fn by_admin(&self, admin_id: &UserId) -> Option<Subscription> {
        self.lock()
            .values()
            .find(|s| s.admin_id == *admin_id)
            .cloned()
    }

    /// Direct lookup by id for assertions.
    pub fn by_id(&self, id: &SubscriptionId) -> Option<Subscription> {
        self.lock().get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, Subscription>> {
        self.records.lock().expect("subscription store lock poisoned")
    }

    fn with_record<T>(
        &self,
        id: &SubscriptionId,
        mutate: impl FnOnce(&mut Subscription) -> T,
    ) -> Result<T, DomainError> {
        let mut records = self.lock();
        let record = records.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::SubscriptionNotFound, "subscription not found")
                .with_detail("subscription_id", id.to_string())
        })?;
        Ok(mutate(record))
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_admin(&self, admin_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.by_admin(admin_id))
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.by_id(id))
    }

    async fn find_member_subscriptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .lock()
            .values()
            .filter(|s| s.member_ids.contains(user_id))
            .cloned()
            .collect())
    }

    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.seed(subscription.clone());
        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.seed(subscription.clone());
        Ok(())
    }

    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        self.lock().remove(id);
        Ok(())
    }

    async fn add_member(
        &self,
        id: &SubscriptionId,
        user_id: &UserId,
    ) -> Result<(), DomainError> {
        self.with_record(id, |record| {
            record.member_ids.insert(*user_id);
        })
    }

    async fn remove_member(
        &self,
        id: &SubscriptionId,
        user_id: &UserId,
    ) -> Result<(), DomainError> {
        self.with_record(id, |record| {
            record.member_ids.remove(user_id);
        })
    }

    async fn set_admin(
        &self,
        id: &SubscriptionId,
        admin_id: &UserId,
        replace_managers: bool,
    ) -> Result<(), DomainError> {
        self.with_record(id, |record| {
            record.admin_id = *admin_id;
            if replace_managers {
                record.manager_ids.clear();
            }
            record.manager_ids.insert(*admin_id);
        })
    }

    async fn set_restore_point(
        &self,
        id: &SubscriptionId,
        restore_point: Option<RestorePoint>,
        consumed: bool,
    ) -> Result<(), DomainError> {
        self.with_record(id, |record| {
            record.restore_point = restore_point;
            if consumed {
                record.times_reverted_due_to_failed_payment += 1;
            }
        })
    }
}

/// In-memory archive for logically deleted subscriptions.
#[derive(Default)]
pub struct InMemoryDeletedSubscriptionStore {
    entries: Mutex<HashMap<SubscriptionId, DeletedSubscription>>,
}

impl InMemoryDeletedSubscriptionStore {
    pub fn seed(&self, deleted: DeletedSubscription) {
        self.lock().insert(deleted.subscription.id, deleted);
    }

    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.lock().contains_key(id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, DeletedSubscription>> {
        self.entries.lock().expect("archive store lock poisoned")
    }
}

#[async_trait]
impl DeletedSubscriptionStore for InMemoryDeletedSubscriptionStore {
    async fn archive(&self, deleted: &DeletedSubscription) -> Result<(), DomainError> {
        self.seed(deleted.clone());
        Ok(())
    }

    async fn find_by_subscription_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<DeletedSubscription>, DomainError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn remove(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        self.lock().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    #[tokio::test]
    async fn add_member_has_set_semantics() {
        let repo = InMemorySubscriptionRepository::default();
        let subscription = Subscription::new_shell(UserId::new(), Timestamp::now());
        let member = UserId::new();
        repo.seed(subscription.clone());

        repo.add_member(&subscription.id, &member).await.unwrap();
        repo.add_member(&subscription.id, &member).await.unwrap();

        assert_eq!(repo.by_id(&subscription.id).unwrap().member_ids.len(), 1);
    }

    #[tokio::test]
    async fn mutating_a_missing_record_fails() {
        let repo = InMemorySubscriptionRepository::default();
        let err = repo
            .add_member(&SubscriptionId::new(), &UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }
}
