//! Bracketing root finder.

use crate::error::Result;

/// Absolute tolerance (in x) at which bisection stops.
pub const BISECT_TOL: f64 = 1e-9;

/// Hard cap on bisection iterations.
const MAX_ITERS: usize = 200;

/// Find a root of `f` on `[lo, hi]` by bisection.
///
/// Returns `Ok(None)` when `f(lo)` and `f(hi)` share a sign (no bracket).
/// Errors from `f` propagate unchanged.
pub fn bisect<F>(mut f: F, lo: f64, hi: f64, tol: f64) -> Result<Option<f64>>
where
    F: FnMut(f64) -> Result<f64>,
{
    let (mut a, mut b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let mut fa = f(a)?;
    let fb = f(b)?;

    if fa == 0.0 {
        return Ok(Some(a));
    }
    if fb == 0.0 {
        return Ok(Some(b));
    }
    if fa.signum() == fb.signum() {
        return Ok(None);
    }

    for _ in 0..MAX_ITERS {
        let mid = 0.5 * (a + b);
        if (b - a) * 0.5 <= tol {
            return Ok(Some(mid));
        }
        let fm = f(mid)?;
        if fm == 0.0 {
            return Ok(Some(mid));
        }
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }

    Ok(Some(0.5 * (a + b)))
}
