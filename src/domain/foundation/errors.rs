//! Error types shared across the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Error codes organized by category.
///
/// The category decides the propagation policy: validation and not-found
/// errors surface to the caller so a specific message can be rendered;
/// configuration errors abort the operation without partial persistence;
/// infrastructure errors surface to the retry semantics of the calling
/// webhook or job system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors (caller-correctable)
    ValidationFailed,
    DuplicateAddOn,
    AddOnNotPresent,
    InvalidPlanCode,

    // Not found errors
    UserNotFound,
    SubscriptionNotFound,
    PlanNotFound,

    // Upstream/configuration errors
    UnknownPlanCode,

    // Infrastructure errors
    DatabaseError,
    ExternalServiceError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::DuplicateAddOn => "DUPLICATE_ADD_ON",
            ErrorCode::AddOnNotPresent => "ADD_ON_NOT_PRESENT",
            ErrorCode::InvalidPlanCode => "INVALID_PLAN_CODE",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            ErrorCode::PlanNotFound => "PLAN_NOT_FOUND",
            ErrorCode::UnknownPlanCode => "UNKNOWN_PLAN_CODE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

impl ErrorCode {
    /// Whether this error is correctable by the caller.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::DuplicateAddOn
                | ErrorCode::AddOnNotPresent
                | ErrorCode::InvalidPlanCode
        )
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    /// Creates an infrastructure error.
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::UnknownPlanCode, "plan code not found: xyz");
        assert_eq!(
            format!("{}", err),
            "[UNKNOWN_PLAN_CODE] plan code not found: xyz"
        );
    }

    #[test]
    fn validation_errors_are_flagged_as_such() {
        assert!(ErrorCode::DuplicateAddOn.is_validation());
        assert!(ErrorCode::AddOnNotPresent.is_validation());
        assert!(!ErrorCode::DatabaseError.is_validation());
        assert!(!ErrorCode::UnknownPlanCode.is_validation());
    }

    #[test]
    fn with_detail_accumulates() {
        let err = DomainError::validation("email", "invalid email")
            .with_detail("reason", "missing @ symbol");
        assert_eq!(err.details.get("field"), Some(&"email".to_string()));
        assert_eq!(err.details.get("reason"), Some(&"missing @ symbol".to_string()));
    }
}
