//! The payment provider's view of a subscription.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::plans::{
    is_standalone_ai_add_on_plan, PlanCatalog, AI_ADD_ON_CODE, MEMBERS_LIMIT_ADD_ON_CODE,
};

use super::change_request::{AddOnUpdate, ChangeTimeframe, SubscriptionChangeRequest};
use super::decision::{is_in_trial, should_change_at_term_end};
use super::errors::SubscriptionChangeError;

/// Subscription lifecycle state reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    /// Billing normally.
    Active,
    /// Cancellation requested; remains usable until the period ends.
    Canceled,
    /// Collection paused; grants no entitlement while paused.
    Paused,
    /// Terminal. Triggers archival of the canonical record.
    Expired,
}

impl ProviderState {
    /// Whether a subscription in this state contributes plan features.
    pub fn contributes_features(&self) -> bool {
        matches!(self, ProviderState::Active | ProviderState::Canceled)
    }

    /// Whether this is the terminal expired state.
    pub fn is_expired(&self) -> bool {
        matches!(self, ProviderState::Expired)
    }
}

/// A quantity-priced add-on attached to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionAddOn {
    pub code: String,
    pub quantity: u32,
    pub unit_amount_cents: i64,
}

impl SubscriptionAddOn {
    pub fn new(code: impl Into<String>, quantity: u32, unit_amount_cents: i64) -> Self {
        Self {
            code: code.into(),
            quantity,
            unit_amount_cents,
        }
    }

    /// An update that keeps this add-on exactly as it is.
    pub fn to_update(&self) -> AddOnUpdate {
        AddOnUpdate::new(self.code.clone(), self.quantity)
            .with_unit_amount_cents(self.unit_amount_cents)
    }
}

/// A change already scheduled on the provider for the next billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub next_plan_code: String,
    pub next_add_ons: Vec<SubscriptionAddOn>,
}

/// Normalized snapshot of a subscription as the provider reports it.
///
/// This is the input to the synchronization engine and the base for building
/// change requests. The provider's wire format never appears here; the
/// vendor client is responsible for producing this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSubscription {
    /// Provider-side subscription id.
    pub id: String,

    pub plan_code: String,
    pub state: ProviderState,
    pub add_ons: Vec<SubscriptionAddOn>,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,

    /// Plan/add-on configuration already queued for next period, if any.
    pub pending_change: Option<PendingChange>,
}

impl ProviderSubscription {
    /// Whether the subscription currently has the given add-on.
    pub fn has_add_on(&self, code: &str) -> bool {
        self.add_ons.iter().any(|a| a.code == code)
    }

    /// Whether the subscription will have the add-on next billing period.
    ///
    /// Either no change is pending and the add-on is present now, or a
    /// change is pending and its next add-on list includes the code.
    pub fn has_add_on_next_period(&self, code: &str) -> bool {
        match &self.pending_change {
            Some(change) => change.next_add_ons.iter().any(|a| a.code == code),
            None => self.has_add_on(code),
        }
    }

    /// Whether this is a standalone AI add-on subscription.
    pub fn is_standalone_ai_add_on(&self) -> bool {
        is_standalone_ai_add_on_plan(&self.plan_code)
    }

    /// Whether the subscription is actively in its trial window at `now`.
    pub fn is_in_trial(&self, now: Timestamp) -> bool {
        is_in_trial(self.trial_end, now)
    }

    /// Decides the timeframe for changing to `new_plan_code`.
    pub fn should_change_at_term_end(
        &self,
        catalog: &PlanCatalog,
        new_plan_code: &str,
        now: Timestamp,
    ) -> Result<bool, SubscriptionChangeError> {
        let current_plan = catalog.find_plan(&self.plan_code).ok_or_else(|| {
            SubscriptionChangeError::UnknownPlan {
                plan_code: self.plan_code.clone(),
            }
        })?;
        let new_plan = catalog.find_plan(new_plan_code).ok_or_else(|| {
            SubscriptionChangeError::UnknownPlan {
                plan_code: new_plan_code.to_string(),
            }
        })?;
        Ok(should_change_at_term_end(
            current_plan,
            new_plan,
            self.is_in_trial(now),
        ))
    }

    /// Builds the request to change this subscription's base plan.
    ///
    /// Seat quantities above one surface as a members-limit add-on update so
    /// per-seat-priced group plans stay compatible with the one-base-plan-
    /// plus-seat-add-on model. The AI add-on is carried over to the new plan
    /// when it is present now (immediate changes) or will still be present
    /// after any pending change (term-end changes), and always for
    /// standalone AI plans.
    pub fn request_for_plan_change(
        &self,
        plan_code: &str,
        quantity: u32,
        at_term_end: bool,
    ) -> SubscriptionChangeRequest {
        let timeframe = if at_term_end {
            ChangeTimeframe::TermEnd
        } else {
            ChangeTimeframe::Now
        };
        let mut request =
            SubscriptionChangeRequest::plan_change(self.id.clone(), timeframe, plan_code);

        if quantity != 1 {
            request.push_add_on_update(AddOnUpdate::new(MEMBERS_LIMIT_ADD_ON_CODE, quantity));
        }

        let carries_ai = self.is_standalone_ai_add_on()
            || (!at_term_end && self.has_add_on(AI_ADD_ON_CODE))
            || (at_term_end && self.has_add_on_next_period(AI_ADD_ON_CODE));
        if carries_ai {
            request.push_add_on_update(AddOnUpdate::new(AI_ADD_ON_CODE, 1));
        }

        request
    }

    /// Builds the request to purchase an add-on.
    ///
    /// # Errors
    ///
    /// `DuplicateAddOn` if the add-on is already on the subscription.
    pub fn request_for_add_on_purchase(
        &self,
        code: &str,
        quantity: u32,
        unit_amount_cents: Option<i64>,
    ) -> Result<SubscriptionChangeRequest, SubscriptionChangeError> {
        if self.has_add_on(code) {
            return Err(SubscriptionChangeError::DuplicateAddOn {
                subscription_id: self.id.clone(),
                add_on_code: code.to_string(),
            });
        }

        let mut updates: Vec<AddOnUpdate> = self.add_ons.iter().map(|a| a.to_update()).collect();
        let mut purchase = AddOnUpdate::new(code, quantity);
        if let Some(cents) = unit_amount_cents {
            purchase = purchase.with_unit_amount_cents(cents);
        }
        updates.push(purchase);

        Ok(SubscriptionChangeRequest::add_on_change(
            self.id.clone(),
            ChangeTimeframe::Now,
            updates,
        ))
    }

    /// Builds the request to change an existing add-on's quantity.
    ///
    /// # Errors
    ///
    /// `AddOnNotPresent` if the subscription doesn't have the add-on.
    pub fn request_for_add_on_update(
        &self,
        code: &str,
        quantity: u32,
    ) -> Result<SubscriptionChangeRequest, SubscriptionChangeError> {
        if !self.has_add_on(code) {
            return Err(SubscriptionChangeError::AddOnNotPresent {
                subscription_id: self.id.clone(),
                add_on_code: code.to_string(),
            });
        }

        let updates = self
            .add_ons
            .iter()
            .map(|a| {
                let mut update = a.to_update();
                if update.code == code {
                    update.quantity = quantity;
                }
                update
            })
            .collect();

        Ok(SubscriptionChangeRequest::add_on_change(
            self.id.clone(),
            ChangeTimeframe::Now,
            updates,
        ))
    }

    /// Builds the request to remove an add-on.
    ///
    /// Removal waits for term end so the paid-for period runs out, except
    /// during a trial where it applies immediately.
    ///
    /// # Errors
    ///
    /// `AddOnNotPresent` if the subscription doesn't have the add-on.
    pub fn request_for_add_on_removal(
        &self,
        code: &str,
        now: Timestamp,
    ) -> Result<SubscriptionChangeRequest, SubscriptionChangeError> {
        if !self.has_add_on(code) {
            return Err(SubscriptionChangeError::AddOnNotPresent {
                subscription_id: self.id.clone(),
                add_on_code: code.to_string(),
            });
        }

        let updates = self
            .add_ons
            .iter()
            .filter(|a| a.code != code)
            .map(|a| a.to_update())
            .collect();
        let timeframe = if self.is_in_trial(now) {
            ChangeTimeframe::Now
        } else {
            ChangeTimeframe::TermEnd
        };

        Ok(SubscriptionChangeRequest::add_on_change(
            self.id.clone(),
            timeframe,
            updates,
        ))
    }

    /// Builds the request to keep an add-on that is pending cancellation.
    ///
    /// # Errors
    ///
    /// `AddOnNotPresent` unless the add-on is present now and a pending
    /// change would drop it.
    pub fn request_for_add_on_reactivation(
        &self,
        code: &str,
    ) -> Result<SubscriptionChangeRequest, SubscriptionChangeError> {
        let reactivated = self.add_ons.iter().find(|a| a.code == code);
        let (reactivated, pending) = match (reactivated, &self.pending_change) {
            (Some(add_on), Some(pending)) => (add_on, pending),
            _ => {
                return Err(SubscriptionChangeError::AddOnNotPresent {
                    subscription_id: self.id.clone(),
                    add_on_code: code.to_string(),
                })
            }
        };

        let mut updates: Vec<AddOnUpdate> = pending
            .next_add_ons
            .iter()
            .filter(|a| a.code != code)
            .map(|a| a.to_update())
            .collect();
        updates.push(reactivated.to_update());

        Ok(SubscriptionChangeRequest::add_on_change(
            self.id.clone(),
            ChangeTimeframe::TermEnd,
            updates,
        ))
    }

    /// Builds the request to revert to the last known-good configuration.
    ///
    /// Add-ons not part of the restore point are wiped: the empty update
    /// list removes any add-ons added by the failed payment attempt.
    ///
    /// # Errors
    ///
    /// `UnknownPlan` if the restore-point plan is not in the catalog.
    pub fn request_for_plan_revert(
        &self,
        catalog: &PlanCatalog,
        previous_plan_code: &str,
        previous_add_ons: &[SubscriptionAddOn],
    ) -> Result<SubscriptionChangeRequest, SubscriptionChangeError> {
        if catalog.find_plan(previous_plan_code).is_none() {
            return Err(SubscriptionChangeError::UnknownPlan {
                plan_code: previous_plan_code.to_string(),
            });
        }

        let mut request = SubscriptionChangeRequest::plan_change(
            self.id.clone(),
            ChangeTimeframe::Now,
            previous_plan_code,
        );
        request.add_on_updates =
            Some(previous_add_ons.iter().map(|a| a.to_update()).collect());
        Ok(request)
    }

    /// Builds the request to upgrade a group plan, keeping all add-ons.
    pub fn request_for_group_plan_upgrade(&self, new_plan_code: &str) -> SubscriptionChangeRequest {
        let mut request = SubscriptionChangeRequest::plan_change(
            self.id.clone(),
            ChangeTimeframe::Now,
            new_plan_code,
        );
        request.add_on_updates = Some(
            self.add_ons
                .iter()
                .map(|a| AddOnUpdate::new(a.code.clone(), a.quantity))
                .collect(),
        );
        request
    }
}
