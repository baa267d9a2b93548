//! Root settings for the entitlement core.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::features::FeatureSet;
use crate::domain::plans::PlanCatalog;

use super::ConfigError;

/// Root application configuration.
///
/// # Example
///
/// ```no_run
/// use entitlements::config::Settings;
///
/// let settings = Settings::load().expect("Failed to load configuration");
/// let baseline = settings.default_features.clone();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Baseline feature set every user gets before any paid source.
    #[serde(default)]
    pub default_features: FeatureSet,

    /// Referral bonus tiers: referred-user threshold to granted features.
    /// The highest threshold at or below the user's count applies.
    #[serde(default)]
    pub referral_bonus: BTreeMap<u32, FeatureSet>,

    /// Features granted through an active SSO linkage.
    #[serde(default)]
    pub sso_features: FeatureSet,

    /// Locally known plans and add-on feature bundles.
    #[serde(default)]
    pub plan_catalog: PlanCatalog,
}

impl Settings {
    /// Load configuration from environment variables.
    ///
    /// Reads variables with the `ENTITLEMENTS` prefix, `__` separating
    /// nested values. If `ENTITLEMENTS_CONFIG_FILE` is set, that YAML file
    /// is loaded first and the environment layered on top.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var("ENTITLEMENTS_CONFIG_FILE") {
            builder = builder.add_source(config::File::with_name(&path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("ENTITLEMENTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Load configuration from a YAML file only.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// The referral bonus for a given referred-user count.
    ///
    /// Picks the highest tier whose threshold the count reaches; empty when
    /// no tier applies.
    pub fn bonus_features_for(&self, referred_user_count: u32) -> FeatureSet {
        self.referral_bonus
            .range(..=referred_user_count)
            .next_back()
            .map(|(_, features)| features.clone())
            .unwrap_or_default()
    }
}
