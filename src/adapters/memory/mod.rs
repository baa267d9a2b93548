//! In-memory adapters for testing.
//!
//! Synchronous, deterministic implementations of the persistence and
//! side-channel ports. Each exposes seed and inspection helpers for test
//! setup and assertions.
//!
//! # Panics
//!
//! These adapters use `.expect()` on lock operations and will panic if a
//! lock is poisoned. Acceptable for test code; production deployments wire
//! real store adapters instead.

mod audit_log;
mod scheduler;
mod sources;
mod subscriptions;
mod users;

pub use audit_log::InMemoryAuditLog;
pub use scheduler::RecordingScheduler;
pub use sources::{InMemoryInstitutionService, InMemoryLegacyPlatform};
pub use subscriptions::{InMemoryDeletedSubscriptionStore, InMemorySubscriptionRepository};
pub use users::InMemoryUserRepository;
