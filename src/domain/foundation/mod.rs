//! Foundation types shared across the domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{SubscriptionId, UserId};
pub use timestamp::Timestamp;
