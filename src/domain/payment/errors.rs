//! Errors raised while building subscription change requests.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Caller-correctable validation errors for add-on and plan operations.
///
/// These are not transient failures: retrying the same request will fail the
/// same way. Callers should render a specific message instead.
#[derive(Debug, Clone, Error)]
pub enum SubscriptionChangeError {
    #[error("subscription {subscription_id} already has add-on '{add_on_code}'")]
    DuplicateAddOn {
        subscription_id: String,
        add_on_code: String,
    },

    #[error("subscription {subscription_id} does not have add-on '{add_on_code}'")]
    AddOnNotPresent {
        subscription_id: String,
        add_on_code: String,
    },

    #[error("plan code not known to the catalog: {plan_code}")]
    UnknownPlan { plan_code: String },
}

impl From<SubscriptionChangeError> for DomainError {
    fn from(err: SubscriptionChangeError) -> Self {
        let code = match &err {
            SubscriptionChangeError::DuplicateAddOn { .. } => ErrorCode::DuplicateAddOn,
            SubscriptionChangeError::AddOnNotPresent { .. } => ErrorCode::AddOnNotPresent,
            SubscriptionChangeError::UnknownPlan { .. } => ErrorCode::UnknownPlanCode,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_domain_error_with_matching_code() {
        let err = SubscriptionChangeError::DuplicateAddOn {
            subscription_id: "sub-1".into(),
            add_on_code: "assistant".into(),
        };
        let domain: DomainError = err.into();
        assert_eq!(domain.code, ErrorCode::DuplicateAddOn);
        assert!(domain.message.contains("assistant"));
    }
}
