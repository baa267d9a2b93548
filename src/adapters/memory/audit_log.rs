//! Recording audit log.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{AuditEntry, AuditLog};

/// Audit log that records entries in memory, with fault injection for the
/// fail-closed paths.
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    fail_next: Mutex<bool>,
}

impl InMemoryAuditLog {
    /// Operation names recorded for a user, in order.
    pub fn operations_for(&self, user_id: &UserId) -> Vec<String> {
        self.entries
            .lock()
            .expect("audit log lock poisoned")
            .iter()
            .filter(|entry| entry.user_id == *user_id)
            .map(|entry| entry.operation.clone())
            .collect()
    }

    /// Make the next append fail.
    pub fn fail_next(&self) {
        *self.fail_next.lock().expect("audit log lock poisoned") = true;
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn add_entry(&self, entry: AuditEntry) -> Result<(), DomainError> {
        let mut fail = self.fail_next.lock().expect("audit log lock poisoned");
        if *fail {
            *fail = false;
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "audit log write failed",
            ));
        }
        drop(fail);
        self.entries
            .lock()
            .expect("audit log lock poisoned")
            .push(entry);
        Ok(())
    }
}
