//! The built-in solver: log-space barrier method wrapped in sequential monomial approximation.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use sizing_model::{Problem, Relation, Solution, SolveError, Solver, VarKey};
use tracing::{debug, info, warn};

use crate::barrier::{
    BarrierError, BarrierProblem, BarrierSettings, Bound, LogSumExp, Objective, log_sum_exp,
};
use crate::compile::{CompiledProblem, InequalityKind, compile};
use crate::elimination::{AffineMap, eliminate};

/// Number of binding constraints reported with an infeasibility.
const REPORTED_BINDING: usize = 3;
/// Phase I stops once every constraint holds with at least this margin.
const PHASE_ONE_MARGIN: f64 = 1e-2;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Barrier duality gap at which a convex subproblem counts as solved.
    pub tolerance: f64,
    /// Looser gaps tried in turn when a solve fails to converge.
    pub fallback_tolerances: Vec<f64>,
    /// Relative cost change between approximations at which the signomial loop stops.
    pub sp_tolerance: f64,
    pub max_sp_iterations: usize,
    pub max_newton_steps: usize,
    /// Objective weight of the elastic slack on each approximated constraint.
    pub slack_penalty: f64,
    /// Slack (log space) above which an approximated constraint counts as violated.
    pub slack_tolerance: f64,
    /// Half-width of the log-space box kept around the initial guess.
    pub log_bound: f64,
    /// Tight constraints with `lhs / rhs` below `1 - tight_tolerance` are reported.
    pub tight_tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            fallback_tolerances: vec![1e-5],
            sp_tolerance: 1e-5,
            max_sp_iterations: 50,
            max_newton_steps: 200,
            slack_penalty: 1e3,
            slack_tolerance: 1e-5,
            log_bound: 40.0,
            tight_tolerance: 1e-3,
        }
    }
}

/// Solves geometric programs directly and signomial programs by repeated local approximation.
#[derive(Debug, Clone, Default)]
pub struct GpSolver {
    options: SolverOptions,
}

impl GpSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }
}

impl Solver for GpSolver {
    fn solve(&self, problem: &Problem<'_>) -> Result<Solution, SolveError> {
        let compiled = compile(problem)?;
        let map = eliminate(compiled.variables.len(), &compiled.equalities)?;
        debug!(
            variables = compiled.variables.len(),
            free = map.free_dim(),
            inequalities = compiled.inequalities.len(),
            equalities = compiled.equalities.len(),
            "compiled problem"
        );

        let tolerances =
            std::iter::once(self.options.tolerance).chain(self.options.fallback_tolerances.iter().copied());
        let mut last = None;
        for tolerance in tolerances {
            let run = Run {
                options: &self.options,
                compiled: &compiled,
                map: &map,
                tolerance,
            };
            match run.execute() {
                Err(err @ SolveError::NonConvergence { .. }) => {
                    warn!(tolerance, error = %err, "solve did not converge");
                    last = Some(err);
                }
                Ok(outcome) => return Ok(self.report(problem, &compiled, &map, outcome)),
                Err(err) => return Err(err),
            }
        }
        Err(last.unwrap_or_else(|| SolveError::NonConvergence {
            iterations: 0,
            reason: "no tolerance configured".into(),
        }))
    }
}

impl GpSolver {
    fn report(
        &self,
        problem: &Problem<'_>,
        compiled: &CompiledProblem,
        map: &AffineMap,
        outcome: Outcome,
    ) -> Solution {
        let y = map.apply(&outcome.w);
        let mut values: BTreeMap<VarKey, f64> = problem.substitutions.iter().collect();
        for (i, key) in compiled.variables.iter().enumerate() {
            values.insert(*key, y[i].exp());
        }
        let cost = problem.objective.evaluate(&values).unwrap_or(f64::NAN);

        let mut solution = Solution::from_si(problem.registry, cost, &values);
        solution.sensitivities = outcome.sensitivities;
        solution.iterations = outcome.iterations;

        for constraint in problem.constraints.iter().filter(|c| c.is_tight()) {
            if constraint.relation() != Relation::LessEq {
                continue;
            }
            let (Some(lhs), Some(rhs)) = (
                constraint.lhs().evaluate(&values),
                constraint.rhs().evaluate(&values),
            ) else {
                continue;
            };
            let ratio = lhs / rhs;
            if ratio < 1.0 - self.options.tight_tolerance {
                warn!(constraint = constraint.name(), ratio, "tight constraint is not tight");
                solution.warnings.push(format!(
                    "constraint '{}' is not tight (lhs/rhs = {ratio:.4})",
                    constraint.name()
                ));
            }
        }

        info!(
            cost,
            iterations = solution.iterations,
            newton_steps = outcome.newton_steps,
            warnings = solution.warnings.len(),
            "solve finished"
        );
        solution
    }
}

struct Outcome {
    w: DVector<f64>,
    sensitivities: BTreeMap<String, f64>,
    iterations: usize,
    newton_steps: usize,
}

/// One attempt at a fixed barrier tolerance.
struct Run<'a> {
    options: &'a SolverOptions,
    compiled: &'a CompiledProblem,
    map: &'a AffineMap,
    tolerance: f64,
}

struct Signomial {
    name: String,
    lhs: (DMatrix<f64>, DVector<f64>),
    rhs: (DMatrix<f64>, DVector<f64>),
}

impl Run<'_> {
    fn settings(&self) -> BarrierSettings {
        BarrierSettings {
            tolerance: self.tolerance,
            max_newton_steps: self.options.max_newton_steps,
        }
    }

    fn non_convergence(&self, iterations: usize, err: BarrierError) -> SolveError {
        SolveError::NonConvergence {
            iterations,
            reason: err.to_string(),
        }
    }

    fn execute(&self) -> Result<Outcome, SolveError> {
        let nw = self.map.free_dim();
        let y0 = DVector::from_vec(self.compiled.initial.clone());
        let center = self.map.project(&y0);

        let mut convex_names = Vec::new();
        let mut convex = Vec::new();
        let mut signomials = Vec::new();
        for inequality in &self.compiled.inequalities {
            match &inequality.kind {
                InequalityKind::Convex(p) => {
                    let (a, b) = self.map.lower(p, nw);
                    convex_names.push(inequality.name.clone());
                    convex.push(LogSumExp::new(a, b));
                }
                InequalityKind::Signomial { lhs, rhs } => signomials.push(Signomial {
                    name: inequality.name.clone(),
                    lhs: self.map.lower(lhs, nw),
                    rhs: self.map.lower(rhs, nw),
                }),
            }
        }
        let (obj_a, obj_b) = self.map.lower(&self.compiled.objective, nw);
        let objective = LogSumExp::new(obj_a, obj_b);

        let boxes: Vec<Bound> = (0..nw)
            .flat_map(|i| {
                [
                    Bound::upper(i, center[i] + self.options.log_bound),
                    Bound::lower(i, center[i] - self.options.log_bound),
                ]
            })
            .collect();

        let (mut w, mut newton_steps) = self.phase_one(&convex, &convex_names, &boxes, center)?;

        let ns = signomials.len();
        let width = nw + ns;
        let mut previous_cost: Option<f64> = None;
        for iteration in 1..=self.options.max_sp_iterations {
            let mut constraints: Vec<LogSumExp> = convex.iter().map(|c| widen(c, width)).collect();
            let mut x0 = DVector::zeros(width);
            x0.rows_mut(0, nw).copy_from(&w);
            for (j, signomial) in signomials.iter().enumerate() {
                let approximated = approximate(signomial, &w, nw + j, width);
                x0[nw + j] = approximated.value(&x0).max(0.0) + 1.0;
                constraints.push(approximated);
            }

            let mut bounds = boxes.clone();
            bounds.extend((0..ns).map(|j| Bound::lower(nw + j, 0.0)));
            let mut linear = DVector::zeros(width);
            for j in 0..ns {
                linear[nw + j] = self.options.slack_penalty;
            }
            let barrier = BarrierProblem {
                objective: Objective {
                    lse: Some(widen(&objective, width)),
                    linear,
                },
                constraints,
                bounds,
            };

            let centered = barrier
                .minimize(x0, self.settings(), &|_| false)
                .map_err(|err| self.non_convergence(iteration, err))?;
            newton_steps += centered.newton_steps;
            w = centered.x.rows(0, nw).into_owned();
            let slacks: Vec<f64> = (0..ns).map(|j| centered.x[nw + j]).collect();
            let cost = objective.value(&w).exp();
            let max_slack = slacks.iter().copied().fold(0.0, f64::max);
            debug!(
                iteration,
                cost,
                max_slack,
                newton_steps = centered.newton_steps,
                "signomial iteration"
            );

            let settled = match previous_cost {
                _ if ns == 0 => true,
                Some(prev) => ((cost - prev) / prev).abs() < self.options.sp_tolerance,
                None => false,
            };
            if settled {
                if max_slack > self.options.slack_tolerance {
                    let mut violated: Vec<(f64, &str)> = slacks
                        .iter()
                        .zip(&signomials)
                        .filter(|(t, _)| **t > self.options.slack_tolerance)
                        .map(|(t, s)| (*t, s.name.as_str()))
                        .collect();
                    violated.sort_by(|a, b| b.0.total_cmp(&a.0));
                    return Err(SolveError::Infeasible {
                        binding: violated
                            .into_iter()
                            .take(REPORTED_BINDING)
                            .map(|(_, name)| name.to_string())
                            .collect(),
                    });
                }

                let names = convex_names
                    .iter()
                    .chain(signomials.iter().map(|s| &s.name));
                let duals = barrier.duals(&centered.x, centered.tau);
                let sensitivities = names.cloned().zip(duals).collect();
                return Ok(Outcome {
                    w,
                    sensitivities,
                    iterations: iteration,
                    newton_steps,
                });
            }
            previous_cost = Some(cost);
        }

        Err(SolveError::NonConvergence {
            iterations: self.options.max_sp_iterations,
            reason: "signomial approximations did not settle".into(),
        })
    }

    /// Find a point strictly inside every convex constraint by minimising their largest violation.
    fn phase_one(
        &self,
        convex: &[LogSumExp],
        names: &[String],
        boxes: &[Bound],
        start: DVector<f64>,
    ) -> Result<(DVector<f64>, usize), SolveError> {
        let nw = start.len();
        let worst = convex
            .iter()
            .map(|c| c.value(&start))
            .fold(f64::NEG_INFINITY, f64::max);
        if worst < -PHASE_ONE_MARGIN || convex.is_empty() {
            return Ok((start, 0));
        }
        if nw == 0 {
            return Err(self.infeasible(convex, names, &start));
        }

        // minimise s subject to f_k(w) - s <= 0
        let width = nw + 1;
        let constraints: Vec<LogSumExp> = convex
            .iter()
            .map(|c| {
                let mut a = widen(c, width).a().clone();
                for r in 0..a.nrows() {
                    a[(r, nw)] = -1.0;
                }
                LogSumExp::new(a, c.b().clone())
            })
            .collect();
        let mut linear = DVector::zeros(width);
        linear[nw] = 1.0;
        let barrier = BarrierProblem {
            objective: Objective { lse: None, linear },
            constraints,
            bounds: boxes.to_vec(),
        };
        let mut x0 = DVector::zeros(width);
        x0.rows_mut(0, nw).copy_from(&start);
        x0[nw] = worst + 1.0;

        let centered = barrier
            .minimize(x0, self.settings(), &|x| x[nw] < -PHASE_ONE_MARGIN)
            .map_err(|err| self.non_convergence(0, err))?;
        let w = centered.x.rows(0, nw).into_owned();
        let s = centered.x[nw];
        debug!(s, newton_steps = centered.newton_steps, "phase one finished");
        if s >= 0.0 {
            return Err(self.infeasible(convex, names, &w));
        }
        Ok((w, centered.newton_steps))
    }

    fn infeasible(&self, convex: &[LogSumExp], names: &[String], w: &DVector<f64>) -> SolveError {
        let mut violations: Vec<(f64, &String)> =
            convex.iter().map(|c| c.value(w)).zip(names).collect();
        violations.sort_by(|a, b| b.0.total_cmp(&a.0));
        SolveError::Infeasible {
            binding: violations
                .into_iter()
                .take(REPORTED_BINDING)
                .map(|(_, name)| name.clone())
                .collect(),
        }
    }
}

fn widen(f: &LogSumExp, width: usize) -> LogSumExp {
    let mut a = DMatrix::zeros(f.a().nrows(), width);
    a.columns_mut(0, f.a().ncols()).copy_from(f.a());
    LogSumExp::new(a, f.b().clone())
}

/// `ln(lhs / m(w)) - t <= 0`, where `m` is the monomial matching `rhs` in value and gradient at `w`.
fn approximate(signomial: &Signomial, w: &DVector<f64>, slack: usize, width: usize) -> LogSumExp {
    let nw = w.len();
    let (rhs_a, rhs_b) = &signomial.rhs;
    let z = rhs_a * w + rhs_b;
    let lse = log_sum_exp(&z);
    let theta = z.map(|v| (v - lse).exp());
    let mono_a = rhs_a.tr_mul(&theta);
    // Σ θ_i (b_i - ln θ_i) equals the exact value at w
    let mono_b: f64 = theta
        .iter()
        .zip(rhs_b.iter())
        .filter(|(t, _)| **t > 0.0)
        .map(|(t, b)| t * (b - t.ln()))
        .sum();

    let (lhs_a, lhs_b) = &signomial.lhs;
    let rows = lhs_a.nrows();
    let mut a = DMatrix::zeros(rows, width);
    let mut b = DVector::zeros(rows);
    for r in 0..rows {
        for c in 0..nw {
            a[(r, c)] = lhs_a[(r, c)] - mono_a[c];
        }
        a[(r, slack)] = -1.0;
        b[r] = lhs_b[r] - mono_b;
    }
    LogSumExp::new(a, b)
}
