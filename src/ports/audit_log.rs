//! Audit log port.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::{DomainError, UserId};

/// One audit trail entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// User the entry is about.
    pub user_id: UserId,

    /// Operation name, e.g. `join-group-subscription`.
    pub operation: String,

    /// Who initiated the operation, if known.
    pub initiator_id: Option<UserId>,

    /// Originating IP, if known.
    pub ip_address: Option<String>,

    /// Free-form context.
    pub info: Value,
}

impl AuditEntry {
    pub fn new(user_id: UserId, operation: impl Into<String>) -> Self {
        Self {
            user_id,
            operation: operation.into(),
            initiator_id: None,
            ip_address: None,
            info: Value::Null,
        }
    }

    pub fn with_initiator(mut self, initiator_id: Option<UserId>) -> Self {
        self.initiator_id = initiator_id;
        self
    }

    pub fn with_ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    pub fn with_info(mut self, info: Value) -> Self {
        self.info = info;
        self
    }
}

/// Port for the audit trail.
///
/// Membership changes fail closed on the audit log: the entry is written
/// before the mutation, and a write failure aborts the change.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an entry.
    async fn add_entry(&self, entry: AuditEntry) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_log_is_object_safe() {
        fn _accepts_dyn(_log: &dyn AuditLog) {}
    }
}
