//! Modelling layer: named quantities, expressions, tagged constraints and the solver boundary.

pub mod constraint;
pub mod error;
pub mod expr;
pub mod model;
pub mod registry;
pub mod solution;
pub mod solver;
pub mod substitution;
pub mod sweep;

pub use constraint::{Constraint, ConstraintGroup, Relation};
pub use error::ModelError;
pub use expr::{Monomial, Posynomial, VarKey, te_exp_minus1};
pub use model::{Model, Problem};
pub use registry::{Quantity, Registry, Shape, VectorVar};
pub use solution::{Solution, SolutionEntry, SolutionValue};
pub use solver::{SolveError, Solver};
pub use substitution::Substitutions;
pub use sweep::{ContourResult, Sweep, SweepPoint, SweepResult};
