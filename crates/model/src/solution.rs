//! Solved values reported in each quantity's declared unit.

use std::collections::BTreeMap;

use serde::Serialize;
use sizing_core::Unit;

use crate::error::ModelError;
use crate::expr::VarKey;
use crate::registry::{Registry, Shape};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SolutionValue {
    Scalar(f64),
    /// One value per element; elements no constraint touches are NaN.
    Vector(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionEntry {
    pub unit: String,
    pub label: String,
    pub value: SolutionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    /// Objective value in SI.
    pub cost: f64,
    pub values: BTreeMap<String, SolutionEntry>,
    /// Dual estimate per constraint name.
    pub sensitivities: BTreeMap<String, f64>,
    pub warnings: Vec<String>,
    pub iterations: usize,
}

impl Solution {
    /// Build a solution from SI values keyed by element, converting into declared units.
    pub fn from_si(registry: &Registry, cost: f64, values: &BTreeMap<VarKey, f64>) -> Self {
        let mut entries = BTreeMap::new();
        for (id, quantity) in registry.iter() {
            let report = |key: VarKey| {
                values
                    .get(&key)
                    .map_or(f64::NAN, |si| quantity.unit.from_si(*si))
            };
            let value = match quantity.shape {
                Shape::Scalar => SolutionValue::Scalar(report(VarKey::scalar(id))),
                Shape::Vector(len) => {
                    SolutionValue::Vector((0..len).map(|i| report(VarKey::element(id, i))).collect())
                }
            };
            entries.insert(
                quantity.name.clone(),
                SolutionEntry {
                    unit: quantity.unit.symbol().to_string(),
                    label: quantity.label.clone(),
                    value,
                },
            );
        }
        Self {
            cost,
            values: entries,
            sensitivities: BTreeMap::new(),
            warnings: Vec::new(),
            iterations: 0,
        }
    }

    pub fn get(&self, name: &str) -> Option<&SolutionEntry> {
        self.values.get(name)
    }

    /// Scalar value in its declared unit.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self.values.get(name)?.value {
            SolutionValue::Scalar(v) => Some(v),
            SolutionValue::Vector(_) => None,
        }
    }

    /// Vector values in their declared unit.
    pub fn vector(&self, name: &str) -> Option<&[f64]> {
        match &self.values.get(name)?.value {
            SolutionValue::Vector(v) => Some(v),
            SolutionValue::Scalar(_) => None,
        }
    }

    /// A value converted into `unit`, e.g. `hft[2]` in metres.
    pub fn value_in(&self, name: &str, index: Option<usize>, unit: &str) -> Result<f64, ModelError> {
        let entry = self
            .values
            .get(name)
            .ok_or_else(|| ModelError::UnknownQuantity(name.to_string()))?;
        let raw = match (&entry.value, index) {
            (SolutionValue::Scalar(v), None) => *v,
            (SolutionValue::Scalar(_), Some(_)) => {
                return Err(ModelError::UnexpectedIndex(name.to_string()));
            }
            (SolutionValue::Vector(_), None) => return Err(ModelError::MissingIndex(name.to_string())),
            (SolutionValue::Vector(v), Some(i)) => {
                *v.get(i).ok_or_else(|| ModelError::IndexOutOfRange {
                    name: name.to_string(),
                    index: i,
                    len: v.len(),
                })?
            }
        };
        let declared = Unit::parse(&entry.unit)?;
        let target = Unit::parse(unit)?;
        Ok(declared.convert(raw, &target)?)
    }
}
