//! Subscription lifecycle handlers.

pub mod group_membership;
pub mod recovery;
pub mod sync_subscription;

pub use group_membership::GroupMembershipHandler;
pub use recovery::SubscriptionRecoveryHandler;
pub use sync_subscription::SyncSubscriptionHandler;
