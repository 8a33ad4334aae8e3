use thiserror::Error;

use crate::error::ModelError;
use crate::model::Problem;
use crate::solution::Solution;

/// Anything able to solve a linked problem. The built-in log-space solver lives in `sizing_solver`.
pub trait Solver {
    fn solve(&self, problem: &Problem<'_>) -> Result<Solution, SolveError>;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error("problem is infeasible; most binding: {}", .binding.join(", "))]
    Infeasible { binding: Vec<String> },
    #[error("solver did not converge after {iterations} iterations: {reason}")]
    NonConvergence { iterations: usize, reason: String },
    #[error(transparent)]
    Model(#[from] ModelError),
}
