//! Canonical subscription aggregate.
//!
//! The internal, provider-agnostic record of one admin's billing
//! relationship. Mutated only by the synchronization engine.

mod aggregate;

pub use aggregate::{
    DeletedSubscription, ProviderStatus, RequesterContext, RestorePoint, Subscription,
};
