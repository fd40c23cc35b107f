//! Variable-to-slot bookkeeping across a set of factors.

use std::collections::BTreeMap;

use crate::linear::jacobian_factor::JacobianFactor;
use crate::linear::Key;

/// For an ordered collection of factors, the ascending union of involved
/// variables and, per variable, the slot it occupies within each factor
/// ([`VariableSlots::ABSENT`] when a factor does not involve it). Combine
/// uses this to lay out the joint matrix and zero-fill missing blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSlots {
    slots: BTreeMap<Key, Vec<usize>>,
}

impl VariableSlots {
    /// Slot sentinel for a variable a factor does not involve.
    pub const ABSENT: usize = usize::MAX;

    /// One pass over the factors.
    pub fn new(factors: &[JacobianFactor]) -> Self {
        let mut slots: BTreeMap<Key, Vec<usize>> = BTreeMap::new();
        for (i, factor) in factors.iter().enumerate() {
            for (j, &key) in factor.keys().iter().enumerate() {
                slots
                    .entry(key)
                    .or_insert_with(|| vec![Self::ABSENT; factors.len()])[i] = j;
            }
        }
        VariableSlots { slots }
    }

    /// Number of distinct variables.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Variables in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.slots.keys()
    }

    /// `(variable, per-factor slots)` in ascending variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Vec<usize>)> {
        self.slots.iter()
    }

    pub fn get(&self, key: Key) -> Option<&Vec<usize>> {
        self.slots.get(&key)
    }
}
