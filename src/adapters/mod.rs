//! Adapters - Implementations of the ports.
//!
//! The in-memory adapters deliver synchronous, deterministic behavior for
//! unit and integration tests. The hook registry is the process-local
//! implementation of the hook bus.

pub mod hooks;
pub mod memory;
