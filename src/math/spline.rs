//! Natural cubic interpolating splines.
//!
//! A spline is stored as its knots plus the second derivative at each knot.
//! With natural boundary conditions the end second derivatives are zero and
//! the interior ones solve a tridiagonal system (Thomas algorithm).

/// Second derivatives at the knots of a natural cubic spline.
///
/// `xs` must be strictly increasing and the same length as `ys`.
pub fn natural_second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n < 3 {
        return vec![0.0; n];
    }

    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let m = n - 2;

    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![0.0; m];

    for i in 0..m {
        let k = i + 1;
        if i > 0 {
            sub[i] = h[k - 1];
        }
        diag[i] = 2.0 * (h[k - 1] + h[k]);
        if i + 1 < m {
            sup[i] = h[k];
        }
        rhs[i] = 6.0 * ((ys[k + 1] - ys[k]) / h[k] - (ys[k] - ys[k - 1]) / h[k - 1]);
    }

    // Forward sweep.
    let mut cp = vec![0.0; m];
    let mut dp = vec![0.0; m];
    cp[0] = sup[0] / diag[0];
    dp[0] = rhs[0] / diag[0];
    for i in 1..m {
        let w = diag[i] - sub[i] * cp[i - 1];
        cp[i] = sup[i] / w;
        dp[i] = (rhs[i] - sub[i] * dp[i - 1]) / w;
    }

    // Back substitution.
    let mut s = vec![0.0; n];
    s[m] = dp[m - 1];
    for i in (0..m - 1).rev() {
        s[i + 1] = dp[i] - cp[i] * s[i + 2];
    }
    s
}

/// Evaluate a natural cubic spline at `x`.
///
/// Values outside `[xs[0], xs[n-1]]` are evaluated on the end segment; callers
/// are expected to enforce the domain.
pub fn eval_spline(xs: &[f64], ys: &[f64], s: &[f64], x: f64) -> f64 {
    let n = xs.len();
    if n == 1 {
        return ys[0];
    }

    // Binary search for the segment [lo, hi] containing x.
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xs[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let h = xs[hi] - xs[lo];
    let a = (xs[hi] - x) / h;
    let b = (x - xs[lo]) / h;
    a * ys[lo] + b * ys[hi] + (a * (a * a - 1.0) * s[lo] + b * (b * b - 1.0) * s[hi]) * h * h / 6.0
}
