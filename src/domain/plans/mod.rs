//! Plan catalog value types.

mod catalog;

pub use catalog::{
    is_standalone_ai_add_on_plan, BillingPeriod, PlanCatalog, PlanDefinition, AI_ADD_ON_CODE,
    MEMBERS_LIMIT_ADD_ON_CODE,
};
