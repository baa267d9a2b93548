//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `SubscriptionRepository` - canonical subscription records
//! - `DeletedSubscriptionStore` - archive for logically deleted records
//! - `UserRepository` - user entitlement records
//!
//! ## Entitlement Source Ports
//!
//! - `InstitutionService` - institutional licensing lookups
//! - `LegacyPlatformClient` - grandfathered terms on the legacy platform
//!
//! ## Side-Channel Ports
//!
//! - `FeatureRefreshScheduler` - fire-and-forget background refresh jobs
//! - `HookBus` - named-hook fan-out that never fails the caller
//! - `AuditLog` - fail-closed audit trail for membership changes

mod audit_log;
mod deleted_subscription_store;
mod hook_bus;
mod institution_service;
mod legacy_platform;
mod scheduler;
mod subscription_repository;
mod user_repository;

pub use audit_log::{AuditEntry, AuditLog};
pub use deleted_subscription_store::DeletedSubscriptionStore;
pub use hook_bus::{hooks, HookBus, HookResult};
pub use institution_service::InstitutionService;
pub use legacy_platform::LegacyPlatformClient;
pub use scheduler::{FeatureRefreshScheduler, RefreshReason};
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::{UserRecord, UserRepository};
