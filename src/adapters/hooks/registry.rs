//! Named-hook dispatch table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::ports::{HookBus, HookResult};

type HookHandler = Box<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Hook bus backed by an in-process dispatch table.
///
/// Handlers are registered per hook name and invoked in registration order.
/// A handler's failure is captured as its own `HookResult::Err` and never
/// prevents the remaining handlers from running. Every fired hook is also
/// recorded, which the tests use for assertions.
///
/// # Panics
///
/// Methods panic if an internal lock is poisoned, which only happens after
/// a handler panicked.
pub struct HookRegistry {
    handlers: RwLock<HashMap<String, Vec<HookHandler>>>,
    fired: Arc<Mutex<Vec<(String, Value)>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            fired: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a handler for a hook name.
    pub fn register(
        &self,
        hook: impl Into<String>,
        handler: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    ) {
        self.handlers
            .write()
            .expect("hook registry lock poisoned")
            .entry(hook.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Handle to the record of fired hooks, in firing order.
    pub fn recorder(&self) -> Arc<Mutex<Vec<(String, Value)>>> {
        Arc::clone(&self.fired)
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HookBus for HookRegistry {
    async fn fire(&self, hook: &str, payload: Value) -> Vec<HookResult> {
        self.fired
            .lock()
            .expect("hook registry lock poisoned")
            .push((hook.to_string(), payload.clone()));

        let handlers = self.handlers.read().expect("hook registry lock poisoned");
        let Some(registered) = handlers.get(hook) else {
            return Vec::new();
        };
        registered
            .iter()
            .map(|handler| match handler(&payload) {
                Ok(value) => HookResult::Ok(value),
                Err(message) => HookResult::Err(message),
            })
            .collect()
    }
}
