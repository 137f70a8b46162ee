//! Dense Cholesky with diagonal regularization.
//!
//! Newton systems from penalty merit functions are symmetric but frequently
//! singular (unknowns that no term curves) or indefinite (bilinear terms away
//! from a minimizer). [`regularized_newton_step`] shifts the diagonal until a
//! factorization exists.

use nalgebra::{DMatrix, DVector};

/// The matrix handed to [`cholesky_in_place`] was not positive definite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NotPositiveDefinite;

/// Relative shift always added to the diagonal.
const BASE_REGULARIZATION: f64 = 1e-9;

/// First shift tried once the unshifted factorization fails.
const FIRST_SHIFT: f64 = 1e-6;

/// Maximum number of shift increases before giving up.
const MAX_SHIFTS: usize = 40;

/// In-place Cholesky (LL^T) factorization. Overwrites the lower triangle of `m` with L.
/// The upper triangle is left unchanged.
pub(crate) fn cholesky_in_place(m: &mut DMatrix<f64>) -> Result<(), NotPositiveDefinite> {
    let n = m.nrows();
    for j in 0..n {
        // L[j,j] = sqrt(M[j,j] - Σ L[j,k]²)
        let mut diag = m[(j, j)];
        for k in 0..j {
            diag -= m[(j, k)] * m[(j, k)];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return Err(NotPositiveDefinite);
        }
        let ljj = diag.sqrt();
        m[(j, j)] = ljj;

        // L[i,j] = (M[i,j] - Σ L[i,k]·L[j,k]) / L[j,j]
        for i in (j + 1)..n {
            let mut sum = m[(i, j)];
            for k in 0..j {
                sum -= m[(i, k)] * m[(j, k)];
            }
            m[(i, j)] = sum / ljj;
        }
    }
    Ok(())
}

/// Solve L·L^T·x = b in place, where L is stored in the lower triangle of `l`.
/// On entry `x` contains b; on exit `x` contains the solution.
pub(crate) fn cholesky_solve_in_place(l: &DMatrix<f64>, x: &mut DVector<f64>) {
    let n = l.nrows();

    // Forward substitution: L·y = b
    for j in 0..n {
        for k in 0..j {
            x[j] -= l[(j, k)] * x[k];
        }
        x[j] /= l[(j, j)];
    }

    // Back substitution: L^T·z = y
    for j in (0..n).rev() {
        for k in (j + 1)..n {
            x[j] -= l[(k, j)] * x[k];
        }
        x[j] /= l[(j, j)];
    }
}

/// Solve `(H + δI)·d = -g` for the smallest shift `δ` on the schedule that
/// makes `H + δI` positive definite.
///
/// Returns the step and the shift used, or `None` if no shift worked.
pub(crate) fn regularized_newton_step(
    hessian: &DMatrix<f64>,
    gradient: &DVector<f64>,
) -> Option<(DVector<f64>, f64)> {
    let n = hessian.nrows();
    let scale = (0..n)
        .map(|i| hessian[(i, i)].abs())
        .fold(1.0_f64, f64::max);

    let base = BASE_REGULARIZATION * scale;
    let mut shift = 0.0;
    for _ in 0..MAX_SHIFTS {
        let mut factor = hessian.clone();
        for i in 0..n {
            factor[(i, i)] += base + shift;
        }
        if cholesky_in_place(&mut factor).is_ok() {
            let mut step = -gradient.clone();
            cholesky_solve_in_place(&factor, &mut step);
            if step.iter().all(|v| v.is_finite()) {
                return Some((step, base + shift));
            }
        }
        shift = if shift == 0.0 {
            FIRST_SHIFT * scale
        } else {
            shift * 10.0
        };
    }
    None
}
