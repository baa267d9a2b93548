//! In-memory entitlement source adapters.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::features::FeatureSet;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{InstitutionService, LegacyPlatformClient};

/// Institution service backed by a seeded map.
#[derive(Default)]
pub struct InMemoryInstitutionService {
    grants: Mutex<HashMap<UserId, FeatureSet>>,
}

impl InMemoryInstitutionService {
    pub fn grant(&self, user_id: UserId, features: FeatureSet) {
        self.grants
            .lock()
            .expect("institution grants lock poisoned")
            .insert(user_id, features);
    }
}

#[async_trait]
impl InstitutionService for InMemoryInstitutionService {
    async fn entitlement_for(&self, user_id: &UserId) -> Result<FeatureSet, DomainError> {
        Ok(self
            .grants
            .lock()
            .expect("institution grants lock poisoned")
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Legacy platform client backed by a seeded map, with fault injection.
#[derive(Default)]
pub struct InMemoryLegacyPlatform {
    grants: Mutex<HashMap<UserId, FeatureSet>>,
    next_error: Mutex<Option<DomainError>>,
}

impl InMemoryLegacyPlatform {
    pub fn grant(&self, user_id: UserId, features: FeatureSet) {
        self.grants
            .lock()
            .expect("legacy grants lock poisoned")
            .insert(user_id, features);
    }

    /// Make the next lookup fail with the given error.
    pub fn fail_with(&self, error: DomainError) {
        *self.next_error.lock().expect("legacy error lock poisoned") = Some(error);
    }
}

#[async_trait]
impl LegacyPlatformClient for InMemoryLegacyPlatform {
    async fn grandfathered_features(
        &self,
        user_id: &UserId,
    ) -> Result<Option<FeatureSet>, DomainError> {
        if let Some(error) = self.next_error.lock().expect("legacy error lock poisoned").take() {
            return Err(error);
        }
        Ok(self
            .grants
            .lock()
            .expect("legacy grants lock poisoned")
            .get(user_id)
            .cloned())
    }
}
