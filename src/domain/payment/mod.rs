//! Payment-provider-side subscription entities and plan-change logic.
//!
//! These types model the provider's view of a subscription and build the
//! change requests sent back to it. They are vendor-agnostic: the actual
//! HTTP/XML client lives behind an external collaborator and is out of scope.

mod change_request;
mod decision;
mod errors;
mod subscription;

pub use change_request::{AddOnUpdate, ChangeTimeframe, SubscriptionChangeRequest};
pub use decision::{is_in_trial, should_change_at_term_end};
pub use errors::SubscriptionChangeError;
pub use subscription::{PendingChange, ProviderState, ProviderSubscription, SubscriptionAddOn};
