//! Linked models: a registry, an objective and every group's constraints behind one substitution stack.

use std::collections::BTreeMap;

use tracing::debug;

use crate::constraint::{Constraint, ConstraintGroup};
use crate::error::ModelError;
use crate::expr::{Posynomial, VarKey};
use crate::registry::Registry;
use crate::solution::Solution;
use crate::solver::{SolveError, Solver};
use crate::substitution::Substitutions;

const OVERRIDE_TOLERANCE: f64 = 1e-12;

/// Everything a solver needs: the constraint set plus the merged substitutions.
#[derive(Debug, Clone)]
pub struct Problem<'a> {
    pub registry: &'a Registry,
    pub objective: &'a Posynomial,
    pub constraints: Vec<&'a Constraint>,
    pub substitutions: Substitutions,
}

#[derive(Debug, Clone)]
pub struct Model {
    registry: Registry,
    objective: Posynomial,
    groups: Vec<ConstraintGroup>,
    /// Registry defaults with group overrides layered on top.
    base: Substitutions,
    user: Substitutions,
}

impl Model {
    /// Link groups into one model, merging their overrides.
    ///
    /// Two groups fixing the same element to different values is rejected rather than resolved by
    /// order.
    pub fn link(
        registry: Registry,
        objective: impl Into<Posynomial>,
        groups: Vec<ConstraintGroup>,
    ) -> Result<Self, ModelError> {
        let objective = objective.into();
        if objective.is_empty() {
            return Err(ModelError::EmptyObjective);
        }
        for term in objective.terms() {
            if !(term.coeff().is_finite() && term.coeff() > 0.0) {
                return Err(ModelError::InvalidCoefficient("objective".into()));
            }
        }

        let mut base = registry.fixed_values();
        let mut owners: BTreeMap<VarKey, (&str, f64)> = BTreeMap::new();
        for group in &groups {
            for (key, value) in group.overrides().iter() {
                if let Some((first, previous)) = owners.get(&key) {
                    let scale = previous.abs().max(value.abs());
                    if (previous - value).abs() > OVERRIDE_TOLERANCE * scale {
                        return Err(ModelError::ConflictingOverride {
                            key: registry.describe(key),
                            first: first.to_string(),
                            second: group.name().to_string(),
                        });
                    }
                }
                owners.insert(key, (group.name(), value));
                base.insert(key, value);
            }
        }

        let constraint_count: usize = groups.iter().map(ConstraintGroup::len).sum();
        debug!(
            quantities = registry.len(),
            groups = groups.len(),
            constraints = constraint_count,
            fixed = base.len(),
            "linked model"
        );

        Ok(Self {
            registry,
            objective,
            groups,
            base,
            user: Substitutions::new(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn objective(&self) -> &Posynomial {
        &self.objective
    }

    pub fn groups(&self) -> &[ConstraintGroup] {
        &self.groups
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.groups.iter().flat_map(|g| g.constraints().iter())
    }

    /// Registry defaults, then group overrides, then user substitutions.
    pub fn substitutions(&self) -> Substitutions {
        let mut merged = self.base.clone();
        merged.overlay(&self.user);
        merged
    }

    /// Fix `name` (or `name[index]`) to `value` expressed in `unit`.
    ///
    /// Returns the user substitution it replaced, if any.
    pub fn substitute(
        &mut self,
        name: &str,
        index: Option<usize>,
        value: f64,
        unit: &str,
    ) -> Result<Option<f64>, ModelError> {
        let key = self.registry.key(name, index)?;
        let si = self.registry.to_si(key, value, unit)?;
        debug!(quantity = %self.registry.describe(key), value, unit, "substitution");
        Ok(self.user.insert(key, si))
    }

    /// The user-layer value (SI) currently fixing `key`.
    pub fn user_substitution(&self, key: VarKey) -> Option<f64> {
        self.user.get(key)
    }

    /// Put the user layer for `key` back to `previous`, removing it when `None`.
    pub fn restore_substitution(&mut self, key: VarKey, previous: Option<f64>) {
        match previous {
            Some(value) => {
                self.user.insert(key, value);
            }
            None => {
                self.user.remove(key);
            }
        }
    }

    pub fn problem(&self) -> Problem<'_> {
        Problem {
            registry: &self.registry,
            objective: &self.objective,
            constraints: self.constraints().collect(),
            substitutions: self.substitutions(),
        }
    }

    pub fn solve(&self, solver: &dyn Solver) -> Result<Solution, SolveError> {
        solver.solve(&self.problem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups(first: f64, second: f64) -> Result<Model, ModelError> {
        let mut registry = Registry::new();
        let w = registry.scalar("W_e", "N", "Empty Weight of Aircraft").unwrap();
        let mut a = ConstraintGroup::new("mission");
        a.fix(&registry, "W_e", None, first, "N").unwrap();
        let mut b = ConstraintGroup::new("cruise2");
        b.fix(&registry, "W_e", None, second, "N").unwrap();
        Model::link(registry, w, vec![a, b])
    }

    #[test]
    fn agreeing_overrides_link() {
        let model = two_groups(40_000.0, 40_000.0).unwrap();
        let key = model.registry().key("W_e", None).unwrap();
        assert_eq!(model.substitutions().get(key), Some(40_000.0));
    }

    #[test]
    fn conflicting_overrides_name_both_groups() {
        let err = two_groups(40_000.0, 41_000.0).unwrap_err();
        assert_eq!(
            err,
            ModelError::ConflictingOverride {
                key: "W_e".into(),
                first: "mission".into(),
                second: "cruise2".into(),
            }
        );
    }

    #[test]
    fn user_layer_wins_and_restores() {
        let mut model = two_groups(40_000.0, 40_000.0).unwrap();
        let key = model.registry().key("W_e", None).unwrap();
        let previous = model.substitute("W_e", None, 50_000.0, "N").unwrap();
        assert_eq!(previous, None);
        assert_eq!(model.substitutions().get(key), Some(50_000.0));
        model.restore_substitution(key, previous);
        assert_eq!(model.substitutions().get(key), Some(40_000.0));
    }
}
