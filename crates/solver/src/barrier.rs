//! Log-barrier interior-point method for convex problems whose constraints are log-sum-exp functions.

use nalgebra::{Cholesky, DMatrix, DVector};
use thiserror::Error;
use tracing::trace;

const TAU_START: f64 = 1.0;
const TAU_GROWTH: f64 = 20.0;
const ARMIJO: f64 = 0.01;
const BACKTRACK: f64 = 0.5;
const MIN_STEP: f64 = 1e-14;
/// Half the squared Newton decrement below which a centering step stops.
const NEWTON_TOLERANCE: f64 = 1e-9;
/// A stalled line search is accepted as centered when the decrement is already this small.
const STALL_DECREMENT: f64 = 1e-3;
/// Relative precision of an evaluated barrier value. Barrier values grow with `tau`, and a
/// predicted decrease below this share of the value cannot be resolved.
const ROUNDOFF: f64 = 64.0 * f64::EPSILON;
const REGULARISATION_TRIES: usize = 12;

#[derive(Debug, Error, Clone, PartialEq)]
pub(crate) enum BarrierError {
    #[error("starting point is not strictly feasible")]
    NotStrictlyFeasible,
    #[error("line search stalled (Newton decrement {decrement:.3e})")]
    LineSearch { decrement: f64 },
    #[error("centering did not converge within {0} Newton steps")]
    NewtonLimit(usize),
    #[error("Newton system is singular")]
    Singular,
}

/// `ln Σ exp(a_i · x + b_i)`, one row of `a` per term.
#[derive(Debug, Clone)]
pub(crate) struct LogSumExp {
    a: DMatrix<f64>,
    b: DVector<f64>,
}

impl LogSumExp {
    pub(crate) fn new(a: DMatrix<f64>, b: DVector<f64>) -> Self {
        debug_assert_eq!(a.nrows(), b.len());
        Self { a, b }
    }

    pub(crate) fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub(crate) fn b(&self) -> &DVector<f64> {
        &self.b
    }

    pub(crate) fn value(&self, x: &DVector<f64>) -> f64 {
        log_sum_exp(&(&self.a * x + &self.b))
    }

    /// Term weights `exp(z_i) / Σ exp(z_j)` at `x`.
    pub(crate) fn weights(&self, x: &DVector<f64>) -> DVector<f64> {
        let z = &self.a * x + &self.b;
        let lse = log_sum_exp(&z);
        z.map(|v| (v - lse).exp())
    }

    /// Value, gradient and `Aᵀ diag(p) A`; the Hessian is that matrix minus `g gᵀ`.
    fn derivatives(&self, x: &DVector<f64>) -> (f64, DVector<f64>, DMatrix<f64>) {
        let z = &self.a * x + &self.b;
        let value = log_sum_exp(&z);
        let p = z.map(|v| (v - value).exp());
        let gradient = self.a.tr_mul(&p);
        let scaled = DMatrix::from_fn(self.a.nrows(), self.a.ncols(), |i, j| self.a[(i, j)] * p[i]);
        let gram = self.a.tr_mul(&scaled);
        (value, gradient, gram)
    }
}

pub(crate) fn log_sum_exp(z: &DVector<f64>) -> f64 {
    if z.is_empty() {
        return f64::NEG_INFINITY;
    }
    let max = z.max();
    if !max.is_finite() {
        return max;
    }
    max + z.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// `sign * x[index] <= limit`
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bound {
    pub index: usize,
    pub sign: f64,
    pub limit: f64,
}

impl Bound {
    pub(crate) fn upper(index: usize, limit: f64) -> Self {
        Self {
            index,
            sign: 1.0,
            limit,
        }
    }

    pub(crate) fn lower(index: usize, limit: f64) -> Self {
        Self {
            index,
            sign: -1.0,
            limit: -limit,
        }
    }

    fn value(&self, x: &DVector<f64>) -> f64 {
        self.sign * x[self.index] - self.limit
    }
}

/// `lse(x) + c · x`; either part may be absent.
#[derive(Debug, Clone)]
pub(crate) struct Objective {
    pub lse: Option<LogSumExp>,
    pub linear: DVector<f64>,
}

impl Objective {
    fn value(&self, x: &DVector<f64>) -> f64 {
        let smooth = self.lse.as_ref().map_or(0.0, |f| f.value(x));
        smooth + self.linear.dot(x)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BarrierSettings {
    /// Target duality gap `m / tau`.
    pub tolerance: f64,
    pub max_newton_steps: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Centered {
    pub x: DVector<f64>,
    pub tau: f64,
    pub newton_steps: usize,
}

/// Minimise the objective subject to `f_k(x) <= 0` for every log-sum-exp constraint and bound.
#[derive(Debug, Clone)]
pub(crate) struct BarrierProblem {
    pub objective: Objective,
    pub constraints: Vec<LogSumExp>,
    pub bounds: Vec<Bound>,
}

impl BarrierProblem {
    fn constraint_count(&self) -> usize {
        self.constraints.len() + self.bounds.len()
    }

    pub(crate) fn strictly_feasible(&self, x: &DVector<f64>) -> bool {
        self.constraints.iter().all(|c| c.value(x) < 0.0)
            && self.bounds.iter().all(|b| b.value(x) < 0.0)
    }

    /// Run the barrier method from a strictly feasible `x0`. `stop` is checked after every Newton
    /// step and ends the run early when it returns true.
    pub(crate) fn minimize(
        &self,
        x0: DVector<f64>,
        settings: BarrierSettings,
        stop: &dyn Fn(&DVector<f64>) -> bool,
    ) -> Result<Centered, BarrierError> {
        if !self.strictly_feasible(&x0) {
            return Err(BarrierError::NotStrictlyFeasible);
        }
        let m = self.constraint_count() as f64;
        let mut x = x0;
        let mut tau = TAU_START;
        let mut newton_steps = 0;
        loop {
            let (steps, stopped) = self.center(&mut x, tau, settings, stop)?;
            newton_steps += steps;
            trace!(tau, steps, gap = m / tau, "centering step");
            if stopped || m / tau < settings.tolerance {
                break;
            }
            tau *= TAU_GROWTH;
        }
        Ok(Centered {
            x,
            tau,
            newton_steps,
        })
    }

    /// Dual estimate `1 / (tau * -f_k)` for each log-sum-exp constraint.
    pub(crate) fn duals(&self, x: &DVector<f64>, tau: f64) -> Vec<f64> {
        self.constraints
            .iter()
            .map(|c| 1.0 / (tau * -c.value(x)))
            .collect()
    }

    fn center(
        &self,
        x: &mut DVector<f64>,
        tau: f64,
        settings: BarrierSettings,
        stop: &dyn Fn(&DVector<f64>) -> bool,
    ) -> Result<(usize, bool), BarrierError> {
        for step in 0..settings.max_newton_steps {
            let (phi, gradient, hessian) = self.derivatives(x, tau);
            let direction = newton_direction(hessian, &gradient)?;
            let decrement = -gradient.dot(&direction);
            if is_centered(decrement, phi) {
                return Ok((step, false));
            }

            let mut alpha = 1.0;
            let next = loop {
                let candidate = &*x + &direction * alpha;
                if let Some(value) = self.barrier_value(&candidate, tau) {
                    if sufficient_decrease(value, phi, alpha, decrement) {
                        break candidate;
                    }
                }
                alpha *= BACKTRACK;
                if alpha < MIN_STEP {
                    if decrement < STALL_DECREMENT {
                        return Ok((step, false));
                    }
                    return Err(BarrierError::LineSearch { decrement });
                }
            };
            *x = next;
            if stop(x) {
                return Ok((step + 1, true));
            }
        }
        Err(BarrierError::NewtonLimit(settings.max_newton_steps))
    }

    /// Barrier function value; `None` outside the strict interior.
    fn barrier_value(&self, x: &DVector<f64>, tau: f64) -> Option<f64> {
        let mut value = tau * self.objective.value(x);
        for constraint in &self.constraints {
            let f = constraint.value(x);
            if f.is_nan() || f >= 0.0 {
                return None;
            }
            value -= (-f).ln();
        }
        for bound in &self.bounds {
            let f = bound.value(x);
            if f.is_nan() || f >= 0.0 {
                return None;
            }
            value -= (-f).ln();
        }
        value.is_finite().then_some(value)
    }

    fn derivatives(&self, x: &DVector<f64>, tau: f64) -> (f64, DVector<f64>, DMatrix<f64>) {
        let n = x.len();
        let mut value = tau * self.objective.linear.dot(x);
        let mut gradient = &self.objective.linear * tau;
        let mut hessian = DMatrix::zeros(n, n);

        if let Some(lse) = &self.objective.lse {
            let (f, g, gram) = lse.derivatives(x);
            value += tau * f;
            hessian += (gram - &g * g.transpose()) * tau;
            gradient += g * tau;
        }

        for constraint in &self.constraints {
            let (f, g, gram) = constraint.derivatives(x);
            let inv = 1.0 / -f;
            value -= (-f).ln();
            hessian += gram * inv + (&g * g.transpose()) * (inv * inv - inv);
            gradient += g * inv;
        }

        for bound in &self.bounds {
            let slack = -bound.value(x);
            let inv = 1.0 / slack;
            value -= slack.ln();
            gradient[bound.index] += bound.sign * inv;
            hessian[(bound.index, bound.index)] += inv * inv;
        }

        (value, gradient, hessian)
    }
}

/// The Newton decrement is below tolerance, or below what the barrier value can resolve.
fn is_centered(decrement: f64, phi: f64) -> bool {
    decrement / 2.0 <= NEWTON_TOLERANCE.max(ROUNDOFF * phi.abs())
}

/// Armijo test; a step must lower the barrier by a share of the predicted decrease.
fn sufficient_decrease(value: f64, phi: f64, alpha: f64, decrement: f64) -> bool {
    value < phi - ARMIJO * alpha * decrement
}

/// Solve `H d = -g`, adding a growing multiple of the identity when `H` is not positive definite.
fn newton_direction(
    hessian: DMatrix<f64>,
    gradient: &DVector<f64>,
) -> Result<DVector<f64>, BarrierError> {
    let rhs = -gradient.clone();
    if let Some(factor) = Cholesky::new(hessian.clone()) {
        return Ok(factor.solve(&rhs));
    }
    let scale = hessian
        .diagonal()
        .iter()
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let mut delta = scale * 1e-12;
    for _ in 0..REGULARISATION_TRIES {
        let mut shifted = hessian.clone();
        for i in 0..shifted.nrows() {
            shifted[(i, i)] += delta;
        }
        if let Some(factor) = Cholesky::new(shifted) {
            return Ok(factor.solve(&rhs));
        }
        delta *= 100.0;
    }
    Err(BarrierError::Singular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_sum_exp_is_shift_stable() {
        let z = DVector::from_vec(vec![1000.0, 1000.0]);
        assert_relative_eq!(log_sum_exp(&z), 1000.0 + 2.0_f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn centering_stops_at_the_resolution_of_large_barrier_values() {
        // decrement left over at tau = 6.4e7 on a full mission
        assert!(is_centered(4e-8, 1.76e11));
        assert!(!is_centered(4e-8, 10.0));
        assert!(is_centered(1e-9, 10.0));
    }

    #[test]
    fn steps_without_decrease_are_rejected() {
        let phi = 1.76e11;
        assert!(!sufficient_decrease(phi, phi, 1e-10, 4e-8));
        assert!(!sufficient_decrease(phi + 1.0, phi, 1.0, 0.5));
        assert!(sufficient_decrease(phi - 1.0, phi, 1.0, 2.0));
    }

    #[test]
    fn minimises_a_linear_objective_over_a_box() {
        // minimise x subject to ln(2) - x <= 0, i.e. x >= ln 2
        let problem = BarrierProblem {
            objective: Objective {
                lse: None,
                linear: DVector::from_vec(vec![1.0]),
            },
            constraints: vec![LogSumExp::new(
                DMatrix::from_row_slice(1, 1, &[-1.0]),
                DVector::from_vec(vec![2.0_f64.ln()]),
            )],
            bounds: vec![Bound::upper(0, 10.0)],
        };
        let settings = BarrierSettings {
            tolerance: 1e-9,
            max_newton_steps: 100,
        };
        let result = problem
            .minimize(DVector::from_vec(vec![5.0]), settings, &|_| false)
            .unwrap();
        assert_relative_eq!(result.x[0], 2.0_f64.ln(), epsilon = 1e-6);
        let duals = problem.duals(&result.x, result.tau);
        assert_relative_eq!(duals[0], 1.0, epsilon = 1e-3);
    }
}
