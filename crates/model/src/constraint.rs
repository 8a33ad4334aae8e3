//! Tagged constraints and the groups (sub-models) that own them.

use sizing_core::Dimension;

use crate::error::ModelError;
use crate::expr::{Posynomial, VarKey};
use crate::registry::Registry;
use crate::substitution::Substitutions;

/// Relation between the two sides; `>=` is stored flipped as `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    Equal,
}

/// A named relation between two posynomials.
///
/// `tight` marks an inequality standing in for an equality: the solver reports it when it is not
/// active at the optimum. `signomial` marks a free-sign relation whose right-hand side has
/// several terms; such constraints need local approximation and must be tagged explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    name: String,
    lhs: Posynomial,
    rhs: Posynomial,
    relation: Relation,
    tight: bool,
    signomial: bool,
}

impl Constraint {
    /// `lhs <= rhs`
    pub fn le(
        name: impl Into<String>,
        lhs: impl Into<Posynomial>,
        rhs: impl Into<Posynomial>,
    ) -> Result<Self, ModelError> {
        Self::build(name.into(), lhs.into(), rhs.into(), Relation::LessEq)
    }

    /// `lhs >= rhs`
    pub fn ge(
        name: impl Into<String>,
        lhs: impl Into<Posynomial>,
        rhs: impl Into<Posynomial>,
    ) -> Result<Self, ModelError> {
        Self::build(name.into(), rhs.into(), lhs.into(), Relation::LessEq)
    }

    /// `lhs == rhs`; both sides must be monomials.
    pub fn eq(
        name: impl Into<String>,
        lhs: impl Into<Posynomial>,
        rhs: impl Into<Posynomial>,
    ) -> Result<Self, ModelError> {
        Self::build(name.into(), lhs.into(), rhs.into(), Relation::Equal)
    }

    fn build(
        name: String,
        lhs: Posynomial,
        rhs: Posynomial,
        relation: Relation,
    ) -> Result<Self, ModelError> {
        if lhs.is_empty() || rhs.is_empty() {
            return Err(ModelError::EmptyExpression(name));
        }
        let mut terms = lhs.terms().iter().chain(rhs.terms());
        let expected: Dimension = match terms.next() {
            Some(first) => first.dimension(),
            None => return Err(ModelError::EmptyExpression(name)),
        };
        for term in lhs.terms().iter().chain(rhs.terms()) {
            if !(term.coeff().is_finite() && term.coeff() > 0.0) {
                return Err(ModelError::InvalidCoefficient(name));
            }
            if !term.dimension().matches(&expected) {
                return Err(ModelError::DimensionMismatch {
                    constraint: name,
                    expected: expected.to_string(),
                    found: term.dimension().to_string(),
                });
            }
        }
        if relation == Relation::Equal
            && (lhs.as_monomial().is_none() || rhs.as_monomial().is_none())
        {
            return Err(ModelError::NonMonomialEquality(name));
        }
        Ok(Self {
            name,
            lhs,
            rhs,
            relation,
            tight: false,
            signomial: false,
        })
    }

    /// Tag as tightened: expected to hold with equality at the optimum.
    pub fn tight(mut self) -> Self {
        self.tight = true;
        self
    }

    /// Tag as signomial (free-sign).
    pub fn signomial(mut self) -> Self {
        self.signomial = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lhs(&self) -> &Posynomial {
        &self.lhs
    }

    pub fn rhs(&self) -> &Posynomial {
        &self.rhs
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn is_tight(&self) -> bool {
        self.tight
    }

    pub fn is_signomial(&self) -> bool {
        self.signomial
    }

    /// True when the right-hand side is not a monomial, i.e. the relation is not GP-compatible.
    pub fn requires_signomial(&self) -> bool {
        self.relation == Relation::LessEq && self.rhs.as_monomial().is_none()
    }

    /// Every element referenced by either side.
    pub fn keys(&self) -> impl Iterator<Item = VarKey> + '_ {
        self.lhs
            .terms()
            .iter()
            .chain(self.rhs.terms())
            .flat_map(|t| t.exponents().keys().copied())
    }
}

/// A sub-model: constraints plus the explicit overrides it declares.
#[derive(Debug, Clone)]
pub struct ConstraintGroup {
    name: String,
    constraints: Vec<Constraint>,
    overrides: Substitutions,
}

impl ConstraintGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
            overrides: Substitutions::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a constraint, prefixing its name with the group's.
    pub fn add(&mut self, constraint: Constraint) -> Result<(), ModelError> {
        let mut constraint = constraint;
        constraint.name = format!("{}.{}", self.name, constraint.name);
        if constraint.requires_signomial() && !constraint.signomial {
            return Err(ModelError::UndeclaredSignomial(constraint.name));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Fix `name[index]` (or the scalar `name`) to `value` given in `unit` for this group.
    pub fn fix(
        &mut self,
        registry: &Registry,
        name: &str,
        index: Option<usize>,
        value: f64,
        unit: &str,
    ) -> Result<(), ModelError> {
        let key = registry.key(name, index)?;
        let si = registry.to_si(key, value, unit)?;
        self.overrides.insert(key, si);
        Ok(())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn overrides(&self) -> &Substitutions {
        &self.overrides
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}
