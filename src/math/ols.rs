//! Least-squares polynomial fitting.
//!
//! Polynomial calibrations solve
//!
//! ```text
//! minimize Σ (y_i - Σ_k c_k u_i^k)^2
//! ```
//!
//! over a Vandermonde design matrix in a centred, scaled abscissa `u`.
//!
//! Implementation choices:
//! - The abscissa is mapped onto `[-1, 1]` before building the design matrix.
//!   Raw control voltages span several volts, and a degree-7 Vandermonde
//!   matrix in raw volts is badly conditioned.
//! - We solve with SVD so the tall (more rows than columns) system is handled
//!   robustly. Nalgebra's `QR::solve` is intended for square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fill one Vandermonde row: `out[k] = u^k`.
pub fn fill_power_row(u: f64, out: &mut [f64]) {
    let mut p = 1.0;
    for slot in out.iter_mut() {
        *slot = p;
        p *= u;
    }
}

/// Fit ascending polynomial coefficients of `degree` to `(u, y)`.
pub fn polyfit(u: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = u.len();
    let cols = degree + 1;
    if n < cols || y.len() != n {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, cols);
    let mut row = vec![0.0; cols];
    for (i, &ui) in u.iter().enumerate() {
        fill_power_row(ui, &mut row);
        for (j, &v) in row.iter().enumerate() {
            design[(i, j)] = v;
        }
    }

    let rhs = DVector::from_column_slice(y);
    solve_least_squares(&design, &rhs).map(|beta| beta.iter().copied().collect())
}

/// Evaluate ascending coefficients at `u` (Horner).
pub fn polyval(coefficients: &[f64], u: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * u + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn polyfit_recovers_exact_cubic() {
        let truth = [0.5, -1.0, 0.25, 2.0];
        let u: Vec<f64> = (0..21).map(|i| -1.0 + i as f64 * 0.1).collect();
        let y: Vec<f64> = u.iter().map(|&ui| polyval(&truth, ui)).collect();

        let coef = polyfit(&u, &y, 3).unwrap();
        for (a, b) in coef.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-9, "coefficient {a} != {b}");
        }
    }

    #[test]
    fn polyfit_needs_enough_points() {
        assert!(polyfit(&[0.0, 1.0], &[0.0, 1.0], 2).is_none());
    }

    #[test]
    fn polyval_uses_ascending_order() {
        // 1 + 2u + 3u^2 at u = 2
        assert_eq!(polyval(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }
}
