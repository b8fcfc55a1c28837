//! Dense symmetric positive-definite solver

use crate::error::{Result, ScorerError};
use ndarray::{Array1, Array2};

/// Solve `a x = b` for symmetric positive-definite `a` via Cholesky
/// factorisation (`a = L L^T`)
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(ScorerError::Fit(format!(
            "cholesky: system is {}x{} with rhs of length {}",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if !(diag > 0.0) || !diag.is_finite() {
            return Err(ScorerError::Fit(format!(
                "matrix not positive definite (pivot {} = {})",
                j, diag
            )));
        }
        let diag = diag.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = v / diag;
        }
    }

    // Forward: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut v = b[i];
        for k in 0..i {
            v -= l[[i, k]] * y[k];
        }
        y[i] = v / l[[i, i]];
    }

    // Backward: L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut v = y[i];
        for k in (i + 1)..n {
            v -= l[[k, i]] * x[k];
        }
        x[i] = v / l[[i, i]];
    }
    Ok(x)
}
