//! Recording feature-refresh scheduler.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{FeatureRefreshScheduler, RefreshReason};

/// Scheduler that records enqueued refreshes instead of running them, with
/// fault injection for the best-effort paths.
#[derive(Default)]
pub struct RecordingScheduler {
    enqueued: Mutex<Vec<(UserId, RefreshReason)>>,
    fail_next: Mutex<bool>,
}

impl RecordingScheduler {
    /// Users a refresh was scheduled for, in order.
    pub fn scheduled(&self) -> Vec<UserId> {
        self.enqueued
            .lock()
            .expect("scheduler lock poisoned")
            .iter()
            .map(|(user_id, _)| *user_id)
            .collect()
    }

    /// Scheduled entries with their reasons.
    pub fn entries(&self) -> Vec<(UserId, RefreshReason)> {
        self.enqueued.lock().expect("scheduler lock poisoned").clone()
    }

    /// Make the next enqueue fail.
    pub fn fail_next(&self) {
        *self.fail_next.lock().expect("scheduler lock poisoned") = true;
    }
}

#[async_trait]
impl FeatureRefreshScheduler for RecordingScheduler {
    async fn schedule_feature_refresh(
        &self,
        user_id: &UserId,
        reason: RefreshReason,
    ) -> Result<(), DomainError> {
        let mut fail = self.fail_next.lock().expect("scheduler lock poisoned");
        if *fail {
            *fail = false;
            return Err(DomainError::infrastructure("refresh queue unavailable"));
        }
        drop(fail);
        self.enqueued
            .lock()
            .expect("scheduler lock poisoned")
            .push((*user_id, reason));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_reason_with_the_user() {
        let scheduler = RecordingScheduler::default();
        let user_id = UserId::new();
        scheduler
            .schedule_feature_refresh(&user_id, RefreshReason::AddToGroup)
            .await
            .unwrap();
        assert_eq!(scheduler.entries(), vec![(user_id, RefreshReason::AddToGroup)]);
    }
}
