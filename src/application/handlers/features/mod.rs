//! Feature entitlement resolution.

pub mod refresh_features;
pub mod sources;

pub use refresh_features::{RefreshFeaturesHandler, RefreshOutcome};
pub use sources::FeatureSources;
