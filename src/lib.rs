//! Entitlements - Feature Resolution and Subscription Synchronization
//!
//! This crate resolves the paid capabilities a user is entitled to across
//! several independent sources (personal plan, group memberships, institution,
//! legacy platform, referral bonuses, SSO, manual overrides) and keeps the
//! internal canonical subscription record synchronized with an external
//! payment provider's view of the subscription.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
