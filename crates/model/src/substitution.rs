use std::collections::BTreeMap;

use crate::expr::VarKey;

/// Fixed values (SI) keyed by quantity element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitutions {
    values: BTreeMap<VarKey, f64>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, key: VarKey, value_si: f64) -> Option<f64> {
        self.values.insert(key, value_si)
    }

    pub fn remove(&mut self, key: VarKey) -> Option<f64> {
        self.values.remove(&key)
    }

    pub fn get(&self, key: VarKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    pub fn contains(&self, key: VarKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Layer `other` on top of `self`; entries in `other` win.
    pub fn overlay(&mut self, other: &Substitutions) {
        for (key, value) in other.iter() {
            self.values.insert(key, value);
        }
    }
}
