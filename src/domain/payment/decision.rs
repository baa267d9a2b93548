//! Timeframe decision for plan changes.

use crate::domain::foundation::Timestamp;
use crate::domain::plans::PlanDefinition;

/// Whether a plan change should wait for the end of the billing term.
///
/// Rules, in order:
/// - During a trial, changes always apply immediately. Trials must never
///   produce partial-period billing artifacts.
/// - Moving off a standalone AI add-on plan onto a regular plan of the same
///   billing cadence applies immediately even when nominally cheaper.
/// - Otherwise a strictly cheaper plan waits for term end (deferring avoids
///   generating unintended credits) and an equal-or-more-expensive plan
///   applies immediately.
pub fn should_change_at_term_end(
    current_plan: &PlanDefinition,
    new_plan: &PlanDefinition,
    is_in_trial: bool,
) -> bool {
    if is_in_trial {
        return false;
    }
    if current_plan.is_standalone_ai_add_on()
        && !new_plan.is_standalone_ai_add_on()
        && current_plan.period == new_plan.period
    {
        return false;
    }
    new_plan.price_in_cents < current_plan.price_in_cents
}

/// Whether a subscription is actively in its trial window at `now`.
pub fn is_in_trial(trial_end: Option<Timestamp>, now: Timestamp) -> bool {
    match trial_end {
        Some(end) => end.is_after(&now),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureSet;
    use crate::domain::plans::BillingPeriod;

    fn plan(code: &str, price: i64, period: BillingPeriod) -> PlanDefinition {
        PlanDefinition {
            plan_code: code.to_string(),
            name: code.to_string(),
            features: FeatureSet::new(),
            group_plan: false,
            members_limit: 0,
            price_in_cents: price,
            members_limit_add_on: None,
            period,
        }
    }

    #[test]
    fn trial_changes_are_always_immediate() {
        let cheap = plan("cheap", 500, BillingPeriod::Monthly);
        let expensive = plan("expensive", 1500, BillingPeriod::Monthly);
        assert!(!should_change_at_term_end(&cheap, &expensive, true));
        assert!(!should_change_at_term_end(&expensive, &cheap, true));
    }

    #[test]
    fn downgrade_waits_for_term_end() {
        let cheap = plan("cheap", 500, BillingPeriod::Monthly);
        let expensive = plan("expensive", 1500, BillingPeriod::Monthly);
        assert!(should_change_at_term_end(&expensive, &cheap, false));
    }

    #[test]
    fn upgrade_applies_immediately() {
        let cheap = plan("cheap", 500, BillingPeriod::Monthly);
        let expensive = plan("expensive", 1500, BillingPeriod::Monthly);
        assert!(!should_change_at_term_end(&cheap, &expensive, false));
    }

    #[test]
    fn equal_price_applies_immediately() {
        let a = plan("a", 500, BillingPeriod::Monthly);
        let b = plan("b", 500, BillingPeriod::Monthly);
        assert!(!should_change_at_term_end(&a, &b, false));
    }

    #[test]
    fn leaving_standalone_ai_plan_is_never_a_downgrade() {
        let standalone = plan("assistant", 800, BillingPeriod::Monthly);
        let regular = plan("collaborator", 500, BillingPeriod::Monthly);
        assert!(!should_change_at_term_end(&standalone, &regular, false));
    }

    #[test]
    fn leaving_standalone_ai_plan_across_cadence_still_defers() {
        let standalone = plan("assistant-annual", 8000, BillingPeriod::Annual);
        let regular = plan("collaborator", 500, BillingPeriod::Monthly);
        assert!(should_change_at_term_end(&standalone, &regular, false));
    }

    #[test]
    fn trial_window_check() {
        let now = Timestamp::now();
        assert!(is_in_trial(Some(now.add_days(7)), now));
        assert!(!is_in_trial(Some(now.add_days(-1)), now));
        assert!(!is_in_trial(None, now));
    }
}
