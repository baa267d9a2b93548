//! FeatureSet value object and merge rules.
//!
//! # Invariants
//!
//! - `merge` is commutative and associative per key (OR, max and
//!   priority-wins all are), so folding any collection of sets yields the
//!   same result regardless of order.
//! - `merge` is total: absent keys take the type's identity (`false` for
//!   booleans, `0` for counts, `standard` for the compile group).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key for the concurrent-editor limit. `-1` means unlimited.
pub const COLLABORATORS: &str = "collaborators";

/// Key for the compile timeout in seconds.
pub const COMPILE_TIMEOUT: &str = "compileTimeout";

/// Key for the compile queue quality tier.
pub const COMPILE_GROUP: &str = "compileGroup";

/// Sentinel collaborator count meaning "no limit".
pub const UNLIMITED_COLLABORATORS: i64 = -1;

/// Finite stand-in for the unlimited sentinel when computing deltas.
///
/// Downstream consumers of `diff` (notifications, analytics) expect a finite
/// number here, so `-1` is normalized to this value on both sides before the
/// delta is taken.
const COLLABORATORS_DELTA_CEILING: i64 = 100;

/// Compile queue tier. `Priority` wins over `Standard` on merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileGroup {
    Standard,
    Priority,
}

impl Default for CompileGroup {
    fn default() -> Self {
        CompileGroup::Standard
    }
}

/// A single capability value.
///
/// Untagged so feature maps read naturally from JSON/YAML config:
/// `{"trackChanges": true, "collaborators": 10, "compileGroup": "priority"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Count(i64),
    Quality(CompileGroup),
}

impl FeatureValue {
    fn as_bool(&self) -> bool {
        match self {
            FeatureValue::Bool(v) => *v,
            // Ill-typed values on a boolean key count as granted if non-identity.
            FeatureValue::Count(n) => *n != 0,
            FeatureValue::Quality(q) => *q == CompileGroup::Priority,
        }
    }

    fn as_count(&self) -> i64 {
        match self {
            FeatureValue::Count(n) => *n,
            FeatureValue::Bool(true) => 1,
            _ => 0,
        }
    }

    fn as_compile_group(&self) -> CompileGroup {
        match self {
            FeatureValue::Quality(q) => *q,
            _ => CompileGroup::Standard,
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Count(v)
    }
}

impl From<CompileGroup> for FeatureValue {
    fn from(v: CompileGroup) -> Self {
        FeatureValue::Quality(v)
    }
}

/// A possibly-partial map of capability key to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeMap<String, FeatureValue>);

impl FeatureSet {
    /// Creates an empty feature set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns true if no capability is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets a capability, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the raw value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.0.get(key)
    }

    /// Whether a boolean capability is granted. Absent keys are `false`.
    pub fn enabled(&self, key: &str) -> bool {
        self.0.get(key).map(FeatureValue::as_bool).unwrap_or(false)
    }

    /// The collaborator limit, defaulting to `0`. `-1` means unlimited.
    pub fn collaborators(&self) -> i64 {
        self.0
            .get(COLLABORATORS)
            .map(FeatureValue::as_count)
            .unwrap_or(0)
    }

    /// The compile timeout in seconds, defaulting to `0`.
    pub fn compile_timeout(&self) -> i64 {
        self.0
            .get(COMPILE_TIMEOUT)
            .map(FeatureValue::as_count)
            .unwrap_or(0)
    }

    /// The compile group, defaulting to `standard`.
    pub fn compile_group(&self) -> CompileGroup {
        self.0
            .get(COMPILE_GROUP)
            .map(FeatureValue::as_compile_group)
            .unwrap_or_default()
    }

    /// Iterates over present keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.0.iter()
    }

    /// Merges two feature sets, key by key.
    ///
    /// The output contains the union of keys. `compileGroup` resolves
    /// priority-wins, `collaborators` takes the max with `-1` dominating,
    /// `compileTimeout` takes the max, and every other key is a boolean OR.
    pub fn merge(&self, other: &FeatureSet) -> FeatureSet {
        let mut merged = BTreeMap::new();
        for key in self.0.keys().chain(other.0.keys()) {
            if merged.contains_key(key) {
                continue;
            }
            let value = merge_value(key, self.0.get(key), other.0.get(key));
            merged.insert(key.clone(), value);
        }
        FeatureSet(merged)
    }

    /// Whether this set already dominates `other`: merging changes nothing.
    pub fn is_better_than(&self, other: &FeatureSet) -> bool {
        self.merge(other) == *self
    }

    /// Computes a "what changed and by how much" record against `expected`.
    ///
    /// Only keys whose values differ are returned, carrying the *expected*
    /// value - except `compileTimeout`, which carries the numeric delta
    /// (`expected - current`), and `collaborators`, where `-1` is normalized
    /// to `100` on both sides before the delta is taken. The asymmetry is
    /// load-bearing: notification and analytics consumers depend on it.
    pub fn diff(current: &FeatureSet, expected: &FeatureSet) -> BTreeMap<String, FeatureValue> {
        let mut changes = BTreeMap::new();
        for key in current.0.keys().chain(expected.0.keys()) {
            if changes.contains_key(key) {
                continue;
            }
            match key.as_str() {
                COLLABORATORS => {
                    let before = normalize_collaborators(current.collaborators());
                    let after = normalize_collaborators(expected.collaborators());
                    if before != after {
                        changes.insert(key.clone(), FeatureValue::Count(after - before));
                    }
                }
                COMPILE_TIMEOUT => {
                    let before = current.compile_timeout();
                    let after = expected.compile_timeout();
                    if before != after {
                        changes.insert(key.clone(), FeatureValue::Count(after - before));
                    }
                }
                _ => {
                    let before = current.0.get(key);
                    let after = expected.0.get(key);
                    if merge_identity_eq(key, before, after) {
                        continue;
                    }
                    let expected_value = after
                        .copied()
                        .unwrap_or_else(|| identity_value(key));
                    changes.insert(key.clone(), expected_value);
                }
            }
        }
        changes
    }

    /// Back-fills the synthetic `references` key after a full merge.
    ///
    /// If the three legacy reference-manager capabilities are all granted,
    /// the combined `references` capability is granted too. This keeps a
    /// historical comparison correct and must run exactly once, after the
    /// fold over all sources - never per source.
    pub fn with_references_backfill(mut self) -> FeatureSet {
        if self.enabled("mendeley") && self.enabled("referencesSearch") && self.enabled("zotero") {
            self.set("references", true);
        }
        self
    }
}

impl From<BTreeMap<String, FeatureValue>> for FeatureSet {
    fn from(map: BTreeMap<String, FeatureValue>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, FeatureValue)> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = (String, FeatureValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn merge_value(key: &str, a: Option<&FeatureValue>, b: Option<&FeatureValue>) -> FeatureValue {
    match key {
        COMPILE_GROUP => {
            let a = a.map(FeatureValue::as_compile_group).unwrap_or_default();
            let b = b.map(FeatureValue::as_compile_group).unwrap_or_default();
            FeatureValue::Quality(a.max(b))
        }
        COLLABORATORS => {
            let a = a.map(FeatureValue::as_count).unwrap_or(0);
            let b = b.map(FeatureValue::as_count).unwrap_or(0);
            FeatureValue::Count(merge_collaborators(a, b))
        }
        COMPILE_TIMEOUT => {
            let a = a.map(FeatureValue::as_count).unwrap_or(0);
            let b = b.map(FeatureValue::as_count).unwrap_or(0);
            FeatureValue::Count(a.max(b))
        }
        _ => {
            let a = a.map(FeatureValue::as_bool).unwrap_or(false);
            let b = b.map(FeatureValue::as_bool).unwrap_or(false);
            FeatureValue::Bool(a || b)
        }
    }
}

/// Max with the unlimited sentinel dominating.
fn merge_collaborators(a: i64, b: i64) -> i64 {
    if a == UNLIMITED_COLLABORATORS || b == UNLIMITED_COLLABORATORS {
        UNLIMITED_COLLABORATORS
    } else {
        a.max(b)
    }
}

fn normalize_collaborators(n: i64) -> i64 {
    if n == UNLIMITED_COLLABORATORS {
        COLLABORATORS_DELTA_CEILING
    } else {
        n
    }
}

fn identity_value(key: &str) -> FeatureValue {
    match key {
        COMPILE_GROUP => FeatureValue::Quality(CompileGroup::Standard),
        COLLABORATORS | COMPILE_TIMEOUT => FeatureValue::Count(0),
        _ => FeatureValue::Bool(false),
    }
}

/// Equality for diff purposes, treating an absent key as the identity.
fn merge_identity_eq(key: &str, a: Option<&FeatureValue>, b: Option<&FeatureValue>) -> bool {
    let identity = identity_value(key);
    let a = a.unwrap_or(&identity);
    let b = b.unwrap_or(&identity);
    match key {
        COMPILE_GROUP => a.as_compile_group() == b.as_compile_group(),
        _ => a.as_bool() == b.as_bool(),
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    fn arb_feature_value() -> impl Strategy<Value = FeatureValue> {
        prop_oneof![
            any::<bool>().prop_map(FeatureValue::Bool),
            prop_oneof![Just(-1i64), 0i64..=500].prop_map(FeatureValue::Count),
            prop_oneof![
                Just(CompileGroup::Standard),
                Just(CompileGroup::Priority)
            ]
            .prop_map(FeatureValue::Quality),
        ]
    }

    fn arb_feature_set() -> impl Strategy<Value = FeatureSet> {
        // A small shared key space so merges actually collide on keys.
        let keyed = prop_oneof![
            Just(COLLABORATORS.to_string()).prop_flat_map(|k| {
                prop_oneof![Just(-1i64), 0i64..=50]
                    .prop_map(move |n| (k.clone(), FeatureValue::Count(n)))
            }),
            Just(COMPILE_TIMEOUT.to_string()).prop_flat_map(|k| {
                (60i64..=7200).prop_map(move |n| (k.clone(), FeatureValue::Count(n)))
            }),
            Just(COMPILE_GROUP.to_string()).prop_flat_map(|k| {
                prop_oneof![Just(CompileGroup::Standard), Just(CompileGroup::Priority)]
                    .prop_map(move |g| (k.clone(), FeatureValue::Quality(g)))
            }),
            "[a-d]".prop_flat_map(|k| {
                any::<bool>().prop_map(move |b| (k.clone(), FeatureValue::Bool(b)))
            }),
        ];
        proptest::collection::vec(keyed, 0..6).prop_map(|pairs| {
            let mut set = FeatureSet::new();
            for (key, value) in pairs {
                set.set(key, value);
            }
            set
        })
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in arb_feature_set(), b in arb_feature_set()) {
            prop_assert_eq!(a.merge(&b), b.merge(&a));
        }

        #[test]
        fn merge_is_associative(
            a in arb_feature_set(),
            b in arb_feature_set(),
            c in arb_feature_set(),
        ) {
            prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
        }

        #[test]
        fn merge_is_idempotent(a in arb_feature_set()) {
            prop_assert_eq!(a.merge(&a), a);
        }

        #[test]
        fn empty_set_is_the_merge_identity(a in arb_feature_set()) {
            prop_assert_eq!(a.merge(&FeatureSet::new()), a.clone());
            prop_assert_eq!(FeatureSet::new().merge(&a), a);
        }

        #[test]
        fn merge_result_is_at_least_as_good_as_either_input(
            a in arb_feature_set(),
            b in arb_feature_set(),
        ) {
            let merged = a.merge(&b);
            prop_assert!(merged.is_better_than(&a));
            prop_assert!(merged.is_better_than(&b));
        }

        #[test]
        fn diff_of_a_set_against_itself_is_empty(a in arb_feature_set()) {
            prop_assert!(FeatureSet::diff(&a, &a).is_empty());
        }

        #[test]
        fn merged_value_survives_a_round_trip(a in arb_feature_set(), b in arb_feature_set()) {
            let merged = a.merge(&b);
            let json = serde_json::to_string(&merged).unwrap();
            let parsed: FeatureSet = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, merged);
        }

        #[test]
        fn arbitrary_value_is_unchanged_by_value_roundtrip(v in arb_feature_value()) {
            let json = serde_json::to_string(&v).unwrap();
            let parsed: FeatureValue = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, v);
        }
    }
}
