//! Parameter sweeps: repeated solves with one quantity temporarily fixed.

use tracing::{info, warn};

use crate::model::Model;
use crate::solution::Solution;
use crate::solver::{SolveError, Solver};

/// One swept quantity and the ordered values it takes.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub quantity: String,
    pub index: Option<usize>,
    pub unit: String,
    pub values: Vec<f64>,
    /// Record failed points as gaps instead of aborting.
    pub skip_failures: bool,
}

impl Sweep {
    pub fn new(quantity: impl Into<String>, unit: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            quantity: quantity.into(),
            index: None,
            unit: unit.into(),
            values,
            skip_failures: false,
        }
    }

    pub fn skip_failures(mut self, skip: bool) -> Self {
        self.skip_failures = skip;
        self
    }

    /// Evenly spaced values from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![start],
            n => (0..n)
                .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepPoint {
    pub value: f64,
    pub outcome: Result<Solution, SolveError>,
}

#[derive(Debug, Clone)]
pub struct SweepResult {
    pub quantity: String,
    pub unit: String,
    pub points: Vec<SweepPoint>,
}

impl SweepResult {
    /// Swept values whose solve failed.
    pub fn gaps(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.outcome.is_err())
            .map(|p| p.value)
            .collect()
    }

    /// `(swept value, output)` pairs for a scalar output; failed points yield `None`.
    pub fn series(&self, output: &str) -> Vec<(f64, Option<f64>)> {
        self.points
            .iter()
            .map(|p| {
                let y = p.outcome.as_ref().ok().and_then(|s| s.scalar(output));
                (p.value, y)
            })
            .collect()
    }

    pub fn solved(&self) -> impl Iterator<Item = (f64, &Solution)> {
        self.points
            .iter()
            .filter_map(|p| p.outcome.as_ref().ok().map(|s| (p.value, s)))
    }
}

/// Two swept quantities solved over their full cartesian product.
#[derive(Debug, Clone)]
pub struct ContourResult {
    pub x: Sweep,
    pub y: Sweep,
    /// Row-major: `points[j * x.values.len() + i]` is `(x.values[i], y.values[j])`.
    pub points: Vec<(f64, f64, Result<Solution, SolveError>)>,
}

impl ContourResult {
    /// Grid of a scalar output, one row per `y` value.
    pub fn grid(&self, output: &str) -> Vec<Vec<Option<f64>>> {
        let width = self.x.values.len();
        if width == 0 {
            return Vec::new();
        }
        self.points
            .chunks(width)
            .map(|row| {
                row.iter()
                    .map(|(_, _, outcome)| outcome.as_ref().ok().and_then(|s| s.scalar(output)))
                    .collect()
            })
            .collect()
    }
}

impl Model {
    /// Solve once per swept value. The user substitution that was in place beforehand is restored
    /// whether the sweep completes or aborts.
    pub fn sweep(&mut self, sweep: &Sweep, solver: &dyn Solver) -> Result<SweepResult, SolveError> {
        let key = self.registry().key(&sweep.quantity, sweep.index)?;
        let previous = self.user_substitution(key);
        let result = self.sweep_points(sweep, solver);
        self.restore_substitution(key, previous);
        let points = result?;
        info!(
            quantity = %sweep.quantity,
            points = points.len(),
            gaps = points.iter().filter(|p| p.outcome.is_err()).count(),
            "sweep finished"
        );
        Ok(SweepResult {
            quantity: sweep.quantity.clone(),
            unit: sweep.unit.clone(),
            points,
        })
    }

    fn sweep_points(
        &mut self,
        sweep: &Sweep,
        solver: &dyn Solver,
    ) -> Result<Vec<SweepPoint>, SolveError> {
        let mut points = Vec::with_capacity(sweep.values.len());
        for &value in &sweep.values {
            self.substitute(&sweep.quantity, sweep.index, value, &sweep.unit)?;
            let outcome = self.solve(solver);
            if let Err(err) = &outcome {
                if !sweep.skip_failures {
                    return Err(err.clone());
                }
                warn!(quantity = %sweep.quantity, value, error = %err, "sweep point failed");
            }
            points.push(SweepPoint { value, outcome });
        }
        Ok(points)
    }

    /// Solve over the grid `x.values × y.values`. Failures always become gaps unless both sweeps
    /// ask to abort.
    pub fn contour(
        &mut self,
        x: &Sweep,
        y: &Sweep,
        solver: &dyn Solver,
    ) -> Result<ContourResult, SolveError> {
        let y_key = self.registry().key(&y.quantity, y.index)?;
        let y_previous = self.user_substitution(y_key);
        let mut points = Vec::with_capacity(x.values.len() * y.values.len());
        let mut failure = None;
        for &y_value in &y.values {
            if let Err(err) = self.substitute(&y.quantity, y.index, y_value, &y.unit) {
                failure = Some(SolveError::from(err));
                break;
            }
            let row_sweep = Sweep {
                skip_failures: x.skip_failures || y.skip_failures,
                ..x.clone()
            };
            match self.sweep(&row_sweep, solver) {
                Ok(row) => points.extend(
                    row.points
                        .into_iter()
                        .map(|p| (p.value, y_value, p.outcome)),
                ),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.restore_substitution(y_key, y_previous);
        match failure {
            Some(err) => Err(err),
            None => Ok(ContourResult {
                x: x.clone(),
                y: y.clone(),
                points,
            }),
        }
    }
}
