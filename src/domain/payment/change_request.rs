//! Change requests sent to the payment provider.

use serde::{Deserialize, Serialize};

/// When a change takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTimeframe {
    /// Apply immediately, prorating the current period.
    Now,
    /// Apply at the next billing boundary.
    TermEnd,
}

/// One add-on line in a change request.
///
/// An update that repeats an add-on's current quantity leaves it untouched;
/// an add-on absent from the list is removed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnUpdate {
    pub code: String,
    pub quantity: u32,
    /// Unit price override in cents, `None` to keep the provider's price.
    pub unit_amount_cents: Option<i64>,
}

impl AddOnUpdate {
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            code: code.into(),
            quantity,
            unit_amount_cents: None,
        }
    }

    pub fn with_unit_amount_cents(mut self, cents: i64) -> Self {
        self.unit_amount_cents = Some(cents);
        self
    }
}

/// A request to change a subscription's plan and/or add-ons.
///
/// At least one of `plan_code` and `add_on_updates` is always set; the
/// constructors enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionChangeRequest {
    pub subscription_id: String,
    pub timeframe: ChangeTimeframe,
    pub plan_code: Option<String>,
    pub add_on_updates: Option<Vec<AddOnUpdate>>,
}

impl SubscriptionChangeRequest {
    /// A request changing the base plan.
    pub fn plan_change(
        subscription_id: impl Into<String>,
        timeframe: ChangeTimeframe,
        plan_code: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            timeframe,
            plan_code: Some(plan_code.into()),
            add_on_updates: None,
        }
    }

    /// A request changing only the add-on lines.
    pub fn add_on_change(
        subscription_id: impl Into<String>,
        timeframe: ChangeTimeframe,
        add_on_updates: Vec<AddOnUpdate>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            timeframe,
            plan_code: None,
            add_on_updates: Some(add_on_updates),
        }
    }

    /// Appends an add-on update, creating the list if needed.
    pub fn push_add_on_update(&mut self, update: AddOnUpdate) {
        self.add_on_updates.get_or_insert_with(Vec::new).push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_change_carries_plan_code_only() {
        let req = SubscriptionChangeRequest::plan_change("sub-1", ChangeTimeframe::TermEnd, "pro");
        assert_eq!(req.plan_code.as_deref(), Some("pro"));
        assert!(req.add_on_updates.is_none());
    }

    #[test]
    fn push_add_on_update_creates_list() {
        let mut req =
            SubscriptionChangeRequest::plan_change("sub-1", ChangeTimeframe::Now, "pro");
        req.push_add_on_update(AddOnUpdate::new("assistant", 1));
        assert_eq!(req.add_on_updates.as_ref().unwrap().len(), 1);
    }
}
