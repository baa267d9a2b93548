//! Time-limited manual feature overrides.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::FeatureSet;

/// A manually granted feature bundle, optionally expiring.
///
/// Overrides with no expiry never lapse. An expired override contributes
/// nothing to the resolved entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOverride {
    /// The capabilities granted by this override.
    pub features: FeatureSet,

    /// When the override stops applying. `None` means never.
    pub expires_at: Option<Timestamp>,
}

impl FeatureOverride {
    /// Whether this override still applies at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry.is_after(&now),
        }
    }

    /// Merges all active overrides down to a single feature set.
    ///
    /// Expiry filtering happens here, before the result is folded into the
    /// aggregate entitlement alongside the other sources.
    pub fn merge_active(overrides: &[FeatureOverride], now: Timestamp) -> FeatureSet {
        overrides
            .iter()
            .filter(|o| o.is_active(now))
            .fold(FeatureSet::new(), |acc, o| acc.merge(&o.features))
    }
}
