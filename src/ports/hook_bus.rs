//! Named-hook fan-out port.

use async_trait::async_trait;
use serde_json::Value;

/// Well-known hook names.
pub mod hooks {
    /// Revoke a Dropbox link after the capability regressed.
    pub const UNLINK_DROPBOX: &str = "unlink-dropbox";

    /// Revoke a GitHub link after the capability regressed.
    pub const UNLINK_GITHUB: &str = "unlink-github";

    /// Tell external systems about a user's new effective entitlement.
    pub const ENTITLEMENT_CHANGED: &str = "entitlement-changed";

    /// A user joined a group subscription.
    pub const GROUP_MEMBER_JOINED: &str = "group-member-joined";

    /// A user left a group subscription.
    pub const GROUP_MEMBER_LEFT: &str = "group-member-left";
}

/// Outcome of one handler invocation.
///
/// Collected into a list, never short-circuiting: a failing handler is
/// reported alongside its peers' successes.
#[derive(Debug, Clone)]
pub enum HookResult {
    Ok(Value),
    Err(String),
}

impl HookResult {
    pub fn is_err(&self) -> bool {
        matches!(self, HookResult::Err(_))
    }
}

/// Port for dispatching named side-effect hooks.
///
/// The contract is deliberately loose: call every handler registered for the
/// name, collect the per-handler results, and never let a single failing
/// handler abort the caller. Firing an unregistered hook returns an empty
/// list.
#[async_trait]
pub trait HookBus: Send + Sync {
    /// Fire a hook by name, returning one result per registered handler.
    async fn fire(&self, hook: &str, payload: Value) -> Vec<HookResult>;
}
