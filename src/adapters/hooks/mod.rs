//! Process-local hook registry.

mod registry;

pub use registry::HookRegistry;
