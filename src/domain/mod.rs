//! Domain layer - pure business logic.
//!
//! Nothing in this layer performs I/O. The feature merge algebra, plan-change
//! decision logic and the canonical subscription transform are all plain
//! functions over value types so they can be tested without any store.

pub mod features;
pub mod foundation;
pub mod payment;
pub mod plans;
pub mod subscription;
