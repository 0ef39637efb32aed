//! Core feature value types
//!
//! Every reducer in this crate produces a [`FeatureMap`]: a flat, ordered
//! mapping from feature name to a finite `f64`. Internally each scalar is
//! carried as a [`FeatureValue`] so callers and tests can distinguish a
//! genuinely zero signal from a computation that fell back to its default.
//! The tag is erased when the value enters the map.

use std::collections::BTreeMap;

use serde::Serialize;

/// Outcome of a single per-scalar computation.
///
/// `Computed` holds a finite value produced by the reduction. `Fallback`
/// marks a scalar that could not be computed and takes its documented
/// default (`0.0`) instead. Non-finite results are normalized to
/// `Fallback` so NaN/Inf can never reach a [`FeatureMap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Computed(f64),
    Fallback,
}

impl FeatureValue {
    /// Wrap a computed value, demoting NaN/Inf to `Fallback`.
    pub fn computed(value: f64) -> Self {
        if value.is_finite() {
            Self::Computed(value)
        } else {
            Self::Fallback
        }
    }

    /// Convert a fallible computation into a tagged value.
    pub fn from_result<E>(result: std::result::Result<f64, E>) -> Self {
        match result {
            Ok(value) => Self::computed(value),
            Err(_) => Self::Fallback,
        }
    }

    /// Convert an absent statistic (empty input) into a tagged value.
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(value) => Self::computed(value),
            None => Self::Fallback,
        }
    }

    /// Flatten to the plain float stored in a [`FeatureMap`].
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Computed(value) => *value,
            Self::Fallback => 0.0,
        }
    }

    /// True if this scalar took its fallback default.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::computed(value)
    }
}

/// Flat mapping from feature name to a finite float.
///
/// Keys are kept sorted so serialized output and iteration order are
/// deterministic. Reducers produce disjoint key sets; merging maps with
/// overlapping keys keeps the later value and logs the collision.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureMap {
    values: BTreeMap<String, f64>,
}

impl FeatureMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tagged scalar, flattening it to its float form.
    pub fn insert(&mut self, name: &str, value: FeatureValue) {
        self.values.insert(name.to_string(), value.as_f64());
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Absorb all entries of `other` into this map.
    pub fn merge(&mut self, other: FeatureMap) {
        for (name, value) in other.values {
            if self.values.insert(name.clone(), value).is_some() {
                tracing::warn!("feature key collision on '{}', keeping later value", name);
            }
        }
    }

    /// Number of features in the map.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the map holds no features.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate features in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// True if every value is finite (always holds for maps built through
    /// [`FeatureMap::insert`]).
    pub fn all_finite(&self) -> bool {
        self.values.values().all(|value| value.is_finite())
    }
}

impl FromIterator<(String, f64)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(&name, FeatureValue::computed(value));
        }
        map
    }
}
