//! Locally known plan definitions.
//!
//! The catalog is an explicit value constructed at startup and passed into
//! the resolution and synchronization components. There is no global mutable
//! plan registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::features::FeatureSet;

/// Add-on code for the AI assistant entitlement.
pub const AI_ADD_ON_CODE: &str = "assistant";

/// Add-on code that raises the seat count of a group plan.
pub const MEMBERS_LIMIT_ADD_ON_CODE: &str = "additional-license";

/// Whether a plan code denotes a standalone AI-assistant-only plan.
///
/// These plans exist so the AI entitlement can be bought without a base
/// plan; moving from one to a regular plan is never treated as a downgrade.
pub fn is_standalone_ai_add_on_plan(plan_code: &str) -> bool {
    matches!(plan_code, "assistant" | "assistant-annual")
}

/// Billing cadence of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Annual,
}

/// A locally known plan definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDefinition {
    /// Stable plan code shared with the payment provider.
    pub plan_code: String,

    /// Display name.
    pub name: String,

    /// Capabilities granted by this plan.
    pub features: FeatureSet,

    /// Whether this plan covers a group rather than one user.
    #[serde(default)]
    pub group_plan: bool,

    /// Base seat count for group plans.
    #[serde(default)]
    pub members_limit: i64,

    /// List price in cents.
    pub price_in_cents: i64,

    /// Add-on code whose quantity raises `members_limit`, if the plan
    /// supports extra seats.
    #[serde(default)]
    pub members_limit_add_on: Option<String>,

    /// Billing cadence.
    pub period: BillingPeriod,
}

impl PlanDefinition {
    /// Whether this plan is a standalone AI add-on plan.
    pub fn is_standalone_ai_add_on(&self) -> bool {
        is_standalone_ai_add_on_plan(&self.plan_code)
    }
}

/// The set of locally known plans and add-on feature bundles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanCatalog {
    plans: BTreeMap<String, PlanDefinition>,

    /// Features granted by an add-on independent of the base plan, keyed by
    /// add-on code. Lets a standalone add-on contribute entitlement even
    /// when the base plan's features do not apply.
    #[serde(default)]
    add_on_features: BTreeMap<String, FeatureSet>,
}

impl PlanCatalog {
    /// Builds a catalog from plan definitions.
    pub fn new(plans: impl IntoIterator<Item = PlanDefinition>) -> Self {
        Self {
            plans: plans
                .into_iter()
                .map(|p| (p.plan_code.clone(), p))
                .collect(),
            add_on_features: BTreeMap::new(),
        }
    }

    /// Registers the feature bundle granted by an add-on.
    pub fn with_add_on_features(mut self, code: impl Into<String>, features: FeatureSet) -> Self {
        self.add_on_features.insert(code.into(), features);
        self
    }

    /// Looks up a plan by code.
    pub fn find_plan(&self, plan_code: &str) -> Option<&PlanDefinition> {
        self.plans.get(plan_code)
    }

    /// Features granted by an add-on, empty if the add-on grants none.
    pub fn add_on_features(&self, code: &str) -> FeatureSet {
        self.add_on_features.get(code).cloned().unwrap_or_default()
    }

    /// Whether a plan code denotes a group plan.
    pub fn is_group_plan_code(&self, plan_code: &str) -> bool {
        self.find_plan(plan_code).map(|p| p.group_plan).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureValue;

    fn plan(code: &str, group: bool, price: i64) -> PlanDefinition {
        PlanDefinition {
            plan_code: code.to_string(),
            name: code.to_string(),
            features: FeatureSet::new().with("versioning", FeatureValue::Bool(true)),
            group_plan: group,
            members_limit: if group { 2 } else { 0 },
            price_in_cents: price,
            members_limit_add_on: group.then(|| MEMBERS_LIMIT_ADD_ON_CODE.to_string()),
            period: BillingPeriod::Monthly,
        }
    }

    #[test]
    fn finds_known_plan() {
        let catalog = PlanCatalog::new(vec![plan("collaborator", false, 1500)]);
        assert!(catalog.find_plan("collaborator").is_some());
        assert!(catalog.find_plan("missing").is_none());
    }

    #[test]
    fn group_plan_codes_are_recognized() {
        let catalog = PlanCatalog::new(vec![
            plan("collaborator", false, 1500),
            plan("group_collaborator", true, 49500),
        ]);
        assert!(catalog.is_group_plan_code("group_collaborator"));
        assert!(!catalog.is_group_plan_code("collaborator"));
        assert!(!catalog.is_group_plan_code("missing"));
    }

    #[test]
    fn standalone_ai_plan_codes() {
        assert!(is_standalone_ai_add_on_plan("assistant"));
        assert!(is_standalone_ai_add_on_plan("assistant-annual"));
        assert!(!is_standalone_ai_add_on_plan("collaborator"));
    }

    #[test]
    fn unknown_add_on_grants_nothing() {
        let catalog = PlanCatalog::default();
        assert!(catalog.add_on_features("assistant").is_empty());
    }
}
