//! Feature entitlement value types and the merge algebra.
//!
//! A [`FeatureSet`] maps capability keys to values. Merging two sets is
//! commutative and associative per key, which lets callers fold an unordered
//! collection of sets (one per entitlement source) in any order and arrive at
//! the same result.

mod feature_set;
mod overrides;

pub use feature_set::{
    CompileGroup, FeatureSet, FeatureValue, COLLABORATORS, COMPILE_GROUP, COMPILE_TIMEOUT,
    UNLIMITED_COLLABORATORS,
};
pub use overrides::FeatureOverride;
