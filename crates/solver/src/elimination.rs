//! Removal of monomial equalities: in log space they are linear, so `y = offset + basis · w`.

use nalgebra::{DMatrix, DVector};
use sizing_model::SolveError;

use crate::compile::{Equality, LogPosynomial};

const PIVOT_TOLERANCE: f64 = 1e-10;
const CONSISTENCY_TOLERANCE: f64 = 1e-8;

/// Affine parametrisation of the log-space variables satisfying every equality.
#[derive(Debug, Clone)]
pub(crate) struct AffineMap {
    offset: DVector<f64>,
    basis: DMatrix<f64>,
    free: Vec<usize>,
}

impl AffineMap {
    pub(crate) fn free_dim(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn apply(&self, w: &DVector<f64>) -> DVector<f64> {
        &self.offset + &self.basis * w
    }

    /// Coordinates of `y` along the free variables.
    pub(crate) fn project(&self, y: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.free.len(), self.free.iter().map(|&j| y[j]))
    }

    /// Dense `(A, b)` of a log posynomial in `w`, padded with zero columns up to `width`.
    pub(crate) fn lower(&self, posynomial: &LogPosynomial, width: usize) -> (DMatrix<f64>, DVector<f64>) {
        let rows = posynomial.terms.len();
        let nw = self.free_dim();
        let mut a = DMatrix::zeros(rows, width);
        let mut b = DVector::zeros(rows);
        for (r, term) in posynomial.terms.iter().enumerate() {
            b[r] = term.b;
            for &(j, e) in &term.a {
                b[r] += e * self.offset[j];
                for c in 0..nw {
                    a[(r, c)] += e * self.basis[(j, c)];
                }
            }
        }
        (a, b)
    }
}

/// Reduce the equality system to row echelon form and parametrise its solution set.
pub(crate) fn eliminate(n: usize, equalities: &[Equality]) -> Result<AffineMap, SolveError> {
    let m = equalities.len();
    let mut matrix = DMatrix::<f64>::zeros(m, n);
    let mut rhs = DVector::zeros(m);
    let mut names: Vec<&str> = Vec::with_capacity(m);
    for (r, equality) in equalities.iter().enumerate() {
        for &(j, e) in &equality.term.a {
            matrix[(r, j)] += e;
        }
        rhs[r] = -equality.term.b;
        names.push(&equality.name);
    }

    let mut pivots = Vec::new();
    let mut row = 0;
    for col in 0..n {
        if row == m {
            break;
        }
        let (best, magnitude) = (row..m)
            .map(|r| (r, matrix[(r, col)].abs()))
            .fold((row, 0.0), |acc, cand| if cand.1 > acc.1 { cand } else { acc });
        if magnitude <= PIVOT_TOLERANCE {
            continue;
        }
        matrix.swap_rows(row, best);
        rhs.swap_rows(row, best);
        names.swap(row, best);

        let pivot = matrix[(row, col)];
        for j in 0..n {
            matrix[(row, j)] /= pivot;
        }
        rhs[row] /= pivot;
        for r in 0..m {
            let factor = matrix[(r, col)];
            if r == row || factor == 0.0 {
                continue;
            }
            for j in 0..n {
                let v = matrix[(row, j)];
                matrix[(r, j)] -= factor * v;
            }
            let v = rhs[row];
            rhs[r] -= factor * v;
        }
        pivots.push(col);
        row += 1;
    }

    for r in row..m {
        if rhs[r].abs() > CONSISTENCY_TOLERANCE {
            return Err(SolveError::Infeasible {
                binding: vec![names[r].to_string()],
            });
        }
    }

    let free: Vec<usize> = (0..n).filter(|j| !pivots.contains(j)).collect();
    let mut offset = DVector::zeros(n);
    let mut basis = DMatrix::zeros(n, free.len());
    for (r, &p) in pivots.iter().enumerate() {
        offset[p] = rhs[r];
        for (c, &f) in free.iter().enumerate() {
            basis[(p, c)] = -matrix[(r, f)];
        }
    }
    for (c, &f) in free.iter().enumerate() {
        basis[(f, c)] = 1.0;
    }

    Ok(AffineMap {
        offset,
        basis,
        free,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::LogTerm;
    use approx::assert_relative_eq;

    fn equality(name: &str, b: f64, a: Vec<(usize, f64)>) -> Equality {
        Equality {
            name: name.into(),
            term: LogTerm { b, a },
        }
    }

    #[test]
    fn parametrisation_satisfies_the_equalities() {
        // y0 - y1 = ln 2, y1 + y2 = 0
        let eqs = vec![
            equality("first", -2.0_f64.ln(), vec![(0, 1.0), (1, -1.0)]),
            equality("second", 0.0, vec![(1, 1.0), (2, 1.0)]),
        ];
        let map = eliminate(3, &eqs).unwrap();
        assert_eq!(map.free_dim(), 1);
        let y = map.apply(&DVector::from_vec(vec![0.7]));
        assert_relative_eq!(y[0] - y[1], 2.0_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(y[1] + y[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn inconsistent_rows_are_infeasible() {
        let eqs = vec![
            equality("a", 0.0, vec![(0, 1.0)]),
            equality("b", -1.0, vec![(0, 1.0)]),
        ];
        assert!(matches!(
            eliminate(1, &eqs),
            Err(SolveError::Infeasible { binding }) if binding == vec!["b".to_string()]
        ));
    }
}
