//! In-memory user entitlement store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::features::FeatureSet;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{UserRecord, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    records: Mutex<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn seed(&self, record: UserRecord) {
        self.lock().insert(record.id, record);
    }

    pub fn record_of(&self, id: &UserId) -> Option<UserRecord> {
        self.lock().get(id).cloned()
    }

    pub fn features_of(&self, id: &UserId) -> Option<FeatureSet> {
        self.lock().get(id).map(|r| r.features.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, UserRecord>> {
        self.records.lock().expect("user store lock poisoned")
    }

    fn with_record<T>(
        &self,
        id: &UserId,
        mutate: impl FnOnce(&mut UserRecord) -> T,
    ) -> Result<T, DomainError> {
        let mut records = self.lock();
        let record = records.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::UserNotFound, "user not found")
                .with_detail("user_id", id.to_string())
        })?;
        Ok(mutate(record))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, DomainError> {
        Ok(self.record_of(id))
    }

    async fn set_features(&self, id: &UserId, features: &FeatureSet) -> Result<(), DomainError> {
        self.with_record(id, |record| {
            record.features = features.clone();
        })
    }

    async fn clear_managed_enrollment(&self, id: &UserId) -> Result<(), DomainError> {
        self.with_record(id, |record| {
            record.managed_by = None;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_features_replaces_the_stored_set() {
        let repo = InMemoryUserRepository::default();
        let user_id = UserId::new();
        repo.seed(UserRecord::new(user_id));

        let features = FeatureSet::new().with("gitBridge", true);
        repo.set_features(&user_id, &features).await.unwrap();
        assert_eq!(repo.features_of(&user_id), Some(features));
    }

    #[tokio::test]
    async fn set_features_for_a_missing_user_fails() {
        let repo = InMemoryUserRepository::default();
        let err = repo
            .set_features(&UserId::new(), &FeatureSet::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);
    }
}
