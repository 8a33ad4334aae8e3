//! Lowering of a [`Problem`] into log space: every monomial becomes `b + a · y` with `y = ln x`.

use std::collections::{BTreeMap, BTreeSet};

use sizing_model::{Monomial, Posynomial, Problem, Relation, SolveError, Substitutions, VarKey};

/// Equalities that still disagree by more than this (in log space) after substitution are infeasible.
const CONSTANT_TOLERANCE: f64 = 1e-9;

/// `b + Σ a_j y_j`, sparse over variable indices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogTerm {
    pub b: f64,
    pub a: Vec<(usize, f64)>,
}

impl LogTerm {
    fn divide(&self, other: &LogTerm) -> LogTerm {
        let mut exponents: BTreeMap<usize, f64> = self.a.iter().copied().collect();
        for &(j, e) in &other.a {
            *exponents.entry(j).or_insert(0.0) -= e;
        }
        LogTerm {
            b: self.b - other.b,
            a: exponents.into_iter().filter(|(_, e)| *e != 0.0).collect(),
        }
    }

    fn is_constant(&self) -> bool {
        self.a.is_empty()
    }
}

/// `ln Σ exp(term)`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogPosynomial {
    pub terms: Vec<LogTerm>,
}

impl LogPosynomial {
    fn divide(&self, monomial: &LogTerm) -> LogPosynomial {
        LogPosynomial {
            terms: self.terms.iter().map(|t| t.divide(monomial)).collect(),
        }
    }

    fn is_constant(&self) -> bool {
        self.terms.iter().all(LogTerm::is_constant)
    }

    fn constant_value(&self) -> f64 {
        log_sum(self.terms.iter().map(|t| t.b))
    }
}

fn log_sum(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

#[derive(Debug, Clone)]
pub(crate) enum InequalityKind {
    /// `ln(lhs / rhs) <= 0` with a monomial right-hand side.
    Convex(LogPosynomial),
    /// Multi-term right-hand side; approximated by a monomial each iteration.
    Signomial {
        lhs: LogPosynomial,
        rhs: LogPosynomial,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Inequality {
    pub name: String,
    pub kind: InequalityKind,
}

#[derive(Debug, Clone)]
pub(crate) struct Equality {
    pub name: String,
    /// `b + a · y = 0`
    pub term: LogTerm,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledProblem {
    pub variables: Vec<VarKey>,
    pub objective: LogPosynomial,
    pub inequalities: Vec<Inequality>,
    pub equalities: Vec<Equality>,
    /// `ln` of one declared unit per variable, in SI.
    pub initial: Vec<f64>,
}

struct Lowering<'a> {
    index: BTreeMap<VarKey, usize>,
    substitutions: &'a Substitutions,
}

impl Lowering<'_> {
    fn monomial(&self, monomial: &Monomial) -> LogTerm {
        let mut b = monomial.coeff().ln();
        let mut a = Vec::new();
        for (key, e) in monomial.exponents() {
            match self.substitutions.get(*key) {
                Some(value) => b += e * value.ln(),
                None => a.push((self.index[key], *e)),
            }
        }
        a.sort_by_key(|(j, _)| *j);
        LogTerm { b, a }
    }

    /// Lower a posynomial, merging terms with identical exponents.
    fn posynomial(&self, posynomial: &Posynomial) -> LogPosynomial {
        let mut terms: Vec<LogTerm> = Vec::with_capacity(posynomial.terms().len());
        for term in posynomial.terms() {
            let lowered = self.monomial(term);
            match terms.iter_mut().find(|t| t.a == lowered.a) {
                Some(existing) => existing.b = log_sum([existing.b, lowered.b].into_iter()),
                None => terms.push(lowered),
            }
        }
        LogPosynomial { terms }
    }
}

pub(crate) fn compile(problem: &Problem<'_>) -> Result<CompiledProblem, SolveError> {
    let substitutions = &problem.substitutions;

    let mut keys = BTreeSet::new();
    let objective_keys = problem
        .objective
        .terms()
        .iter()
        .flat_map(|t| t.exponents().keys().copied());
    let constraint_keys = problem.constraints.iter().flat_map(|c| c.keys());
    for key in objective_keys.chain(constraint_keys) {
        if !substitutions.contains(key) {
            keys.insert(key);
        }
    }
    let variables: Vec<VarKey> = keys.into_iter().collect();
    let index = variables.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let lowering = Lowering {
        index,
        substitutions,
    };

    let objective = lowering.posynomial(problem.objective);
    let mut inequalities = Vec::new();
    let mut equalities = Vec::new();

    for constraint in &problem.constraints {
        let name = constraint.name().to_string();
        let lhs = lowering.posynomial(constraint.lhs());
        let rhs = lowering.posynomial(constraint.rhs());
        match constraint.relation() {
            Relation::Equal => {
                // Both sides are single monomials by construction.
                let term = lhs.terms[0].divide(&rhs.terms[0]);
                if term.is_constant() {
                    if term.b.abs() > CONSTANT_TOLERANCE {
                        return Err(SolveError::Infeasible {
                            binding: vec![name],
                        });
                    }
                    continue;
                }
                equalities.push(Equality { name, term });
            }
            Relation::LessEq if rhs.terms.len() == 1 => {
                let ratio = lhs.divide(&rhs.terms[0]);
                if ratio.is_constant() {
                    if ratio.constant_value() > CONSTANT_TOLERANCE {
                        return Err(SolveError::Infeasible {
                            binding: vec![name],
                        });
                    }
                    continue;
                }
                inequalities.push(Inequality {
                    name,
                    kind: InequalityKind::Convex(ratio),
                });
            }
            Relation::LessEq => {
                if lhs.is_constant() && rhs.is_constant() {
                    if lhs.constant_value() - rhs.constant_value() > CONSTANT_TOLERANCE {
                        return Err(SolveError::Infeasible {
                            binding: vec![name],
                        });
                    }
                    continue;
                }
                inequalities.push(Inequality {
                    name,
                    kind: InequalityKind::Signomial { lhs, rhs },
                });
            }
        }
    }

    let initial = variables
        .iter()
        .map(|key| problem.registry.quantity(key.id).unit.scale().ln())
        .collect();

    Ok(CompiledProblem {
        variables,
        objective,
        inequalities,
        equalities,
        initial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sizing_model::{Constraint, ConstraintGroup, Model, Registry};

    #[test]
    fn substituted_quantities_fold_into_coefficients() {
        let mut registry = Registry::new();
        let w = registry.scalar("W", "N", "Weight").unwrap();
        let w_e = registry.fixed("W_e", 2.0, "N", "Empty Weight").unwrap();
        let mut group = ConstraintGroup::new("g");
        group.add(Constraint::ge("weight", &w, &w_e).unwrap()).unwrap();
        let model = Model::link(registry, w, vec![group]).unwrap();
        let compiled = compile(&model.problem()).unwrap();

        assert_eq!(compiled.variables.len(), 1);
        match &compiled.inequalities[0].kind {
            InequalityKind::Convex(p) => {
                assert_eq!(p.terms.len(), 1);
                assert_relative_eq!(p.terms[0].b, 2.0_f64.ln(), epsilon = 1e-12);
                assert_eq!(p.terms[0].a, vec![(0, -1.0)]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn violated_constant_constraints_are_infeasible() {
        let mut registry = Registry::new();
        let w = registry.scalar("W", "N", "Weight").unwrap();
        let a = registry.fixed("a", 3.0, "N", "A").unwrap();
        let b = registry.fixed("b", 2.0, "N", "B").unwrap();
        let mut group = ConstraintGroup::new("g");
        group.add(Constraint::le("fixed", &a, &b).unwrap()).unwrap();
        let model = Model::link(registry, w, vec![group]).unwrap();
        let err = compile(&model.problem()).unwrap_err();
        assert_eq!(
            err,
            SolveError::Infeasible {
                binding: vec!["g.fixed".into()]
            }
        );
    }
}
