//! Built-in solver for linked sizing models.
//!
//! Monomial equalities are eliminated in log space, the remaining geometric program is solved with
//! a log-barrier Newton method, and constraints tagged signomial are replaced by their local
//! monomial approximation until the cost settles.

mod barrier;
mod compile;
mod elimination;
mod sp;

pub use sp::{GpSolver, SolverOptions};
