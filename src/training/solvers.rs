//! Numerical solvers for the regularized least-squares problem
//!
//! Every solver minimizes `||y - Xw||² + alpha * ||w||²` over `w`. Inputs are
//! expected to be centered already when an intercept is being fit.

use crate::error::{Result, WineError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

/// Solve symmetric positive-definite system Ax = b using Cholesky decomposition.
/// Retries once with a tiny diagonal shift if the matrix is not numerically PD.
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    match cholesky_factor(a) {
        Some(l) => Some(cholesky_substitute(&l, b)),
        None => {
            let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
            let mut a_reg = a.clone();
            for k in 0..n {
                a_reg[[k, k]] += ridge;
            }
            cholesky_factor(&a_reg).map(|l| cholesky_substitute(&l, b))
        }
    }
}

/// Lower-triangular factor L with A = L * L^T, or None if A is not PD
fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

fn cholesky_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // Forward substitution: L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Matrix inversion via Gauss-Jordan elimination with partial pivoting (fallback)
pub(crate) fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // Augmented matrix [M | I]
    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }

    Some(inv)
}

/// Gram matrix X^T X + alpha * I and moment vector X^T y
fn normal_equations(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> (Array2<f64>, Array1<f64>) {
    let mut xtx = x.t().dot(x);
    for i in 0..xtx.nrows() {
        xtx[[i, i]] += alpha;
    }
    (xtx, x.t().dot(y))
}

/// Direct solve of the normal equations.
pub fn solve_cholesky(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<Array1<f64>> {
    let (xtx, xty) = normal_equations(x, y, alpha);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Ok(w);
    }
    match matrix_inverse(&xtx) {
        Some(inv) => Ok(inv.dot(&xty)),
        None => Err(WineError::ComputationError(
            "Matrix is singular, cannot solve normal equations".to_string(),
        )),
    }
}

/// Spectral solve: with X^T X = V diag(s²) V^T, w = V diag(1 / (s² + alpha)) V^T X^T y.
///
/// Directions whose regularized eigenvalue vanishes are dropped, which gives
/// the minimum-norm solution for rank-deficient problems.
pub fn solve_svd(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<Array1<f64>> {
    let (gram, xty) = normal_equations(x, y, 0.0);
    let (eigenvalues, eigenvectors) = symmetric_eigen(&gram)?;

    let largest = eigenvalues.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let cutoff = largest.max(alpha) * 1e-12;

    let mut w = Array1::zeros(x.ncols());
    for (k, &lambda) in eigenvalues.iter().enumerate() {
        let denom = lambda.max(0.0) + alpha;
        if denom <= cutoff {
            continue;
        }
        let v = eigenvectors.column(k);
        let proj = v.dot(&xty) / denom;
        w.scaled_add(proj, &v);
    }

    Ok(w)
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
/// Returns eigenvalues and the matrix whose columns are the eigenvectors.
pub(crate) fn symmetric_eigen(a: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    const MAX_SWEEPS: usize = 100;

    let n = a.nrows();
    if n != a.ncols() {
        return Err(WineError::ShapeError {
            expected: "square matrix".to_string(),
            actual: format!("{}x{}", a.nrows(), a.ncols()),
        });
    }

    let mut a = a.clone();
    let mut v = Array2::<f64>::eye(n);
    let total: f64 = a.iter().map(|x| x * x).sum();

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= 1e-30 * total.max(f64::MIN_POSITIVE) {
            return Ok((a.diag().to_owned(), v));
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    if a.iter().any(|x| !x.is_finite()) {
        return Err(WineError::ComputationError(
            "Eigendecomposition produced non-finite values".to_string(),
        ));
    }
    warn!(sweeps = MAX_SWEEPS, "Jacobi eigendecomposition did not fully converge");
    Ok((a.diag().to_owned(), v))
}

/// CGLS iterations on the damped least-squares system `[X; sqrt(alpha) I] w ≈ [y; 0]`.
pub fn solve_lsqr(
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: f64,
    max_iter: usize,
    tol: f64,
) -> Result<Array1<f64>> {
    let n_features = x.ncols();
    let damp = alpha.sqrt();

    let mut w = Array1::<f64>::zeros(n_features);
    let mut r_data = y.clone();
    let mut r_damp = Array1::<f64>::zeros(n_features);
    let mut s = x.t().dot(&r_data);
    let mut p = s.clone();
    let mut gamma = s.dot(&s);
    let gamma_0 = gamma;

    if gamma_0 == 0.0 {
        return Ok(w);
    }

    for _ in 0..max_iter {
        let q_data = x.dot(&p);
        let q_damp = &p * damp;
        let delta = q_data.dot(&q_data) + q_damp.dot(&q_damp);
        if delta <= 0.0 {
            break;
        }

        let step = gamma / delta;
        w.scaled_add(step, &p);
        r_data.scaled_add(-step, &q_data);
        r_damp.scaled_add(-step, &q_damp);

        s = x.t().dot(&r_data) + &r_damp * damp;
        let gamma_next = s.dot(&s);
        if gamma_next.sqrt() <= tol * gamma_0.sqrt() {
            return Ok(w);
        }

        let beta = gamma_next / gamma;
        p = &s + &(p * beta);
        gamma = gamma_next;
    }

    check_finite(&w, "lsqr")?;
    Ok(w)
}

/// Matrix-free conjugate gradient on `(X^T X + alpha I) w = X^T y`.
pub fn solve_sparse_cg(
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: f64,
    max_iter: usize,
    tol: f64,
) -> Result<Array1<f64>> {
    let apply = |v: &Array1<f64>| -> Array1<f64> { x.t().dot(&x.dot(v)) + v * alpha };

    let b = x.t().dot(y);
    let b_norm = b.dot(&b).sqrt();
    let mut w = Array1::<f64>::zeros(x.ncols());
    if b_norm == 0.0 {
        return Ok(w);
    }

    let mut r = b.clone();
    let mut p = r.clone();
    let mut rs = r.dot(&r);

    for _ in 0..max_iter {
        let ap = apply(&p);
        let pap = p.dot(&ap);
        if pap <= 0.0 {
            break;
        }

        let step = rs / pap;
        w.scaled_add(step, &p);
        r.scaled_add(-step, &ap);

        let rs_next = r.dot(&r);
        if rs_next.sqrt() <= tol * b_norm {
            return Ok(w);
        }
        p = &r + &(p * (rs_next / rs));
        rs = rs_next;
    }

    check_finite(&w, "sparse_cg")?;
    Ok(w)
}

/// Stochastic average gradient (`saga = false`) or SAGA (`saga = true`).
///
/// Minimizes the per-sample-averaged objective
/// `(1 / 2n) ||y - Xw||² + (alpha / 2n) ||w||²`, which has the same minimizer
/// as the ridge objective. Sampling is driven by a seeded ChaCha8 stream so
/// repeated fits are identical.
pub fn solve_sag(
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: f64,
    max_iter: usize,
    tol: f64,
    seed: u64,
    saga: bool,
) -> Result<Array1<f64>> {
    let n_samples = x.nrows();
    let n_features = x.ncols();
    if n_samples == 0 {
        return Err(WineError::DataError("Cannot fit on zero samples".to_string()));
    }

    let alpha_scaled = alpha / n_samples as f64;
    let max_sq_norm = x
        .rows()
        .into_iter()
        .map(|row| row.dot(&row))
        .fold(0.0_f64, f64::max);
    let step = 1.0 / (max_sq_norm + alpha_scaled).max(f64::MIN_POSITIVE);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut w = Array1::<f64>::zeros(n_features);
    let mut gradient_memory = vec![0.0; n_samples];
    let mut seen = vec![false; n_samples];
    let mut n_seen = 0usize;
    let mut sum_gradient = Array1::<f64>::zeros(n_features);

    for epoch in 0..max_iter {
        let w_previous = w.clone();

        for _ in 0..n_samples {
            let i = rng.gen_range(0..n_samples);
            let row: ArrayView1<f64> = x.row(i);
            let g_new = row.dot(&w) - y[i];
            let g_old = gradient_memory[i];

            if !seen[i] {
                seen[i] = true;
                n_seen += 1;
            }

            if saga {
                // unbiased estimate uses the table average before the update
                let mut direction = &sum_gradient / n_samples as f64;
                direction.scaled_add(g_new - g_old, &row);
                direction.scaled_add(alpha_scaled, &w);
                w.scaled_add(-step, &direction);
                sum_gradient.scaled_add(g_new - g_old, &row);
            } else {
                sum_gradient.scaled_add(g_new - g_old, &row);
                let mut direction = &sum_gradient / n_seen as f64;
                direction.scaled_add(alpha_scaled, &w);
                w.scaled_add(-step, &direction);
            }
            gradient_memory[i] = g_new;
        }

        check_finite(&w, if saga { "saga" } else { "sag" })?;

        let max_change = (&w - &w_previous).iter().fold(0.0_f64, |m, d| m.max(d.abs()));
        let max_weight = w.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if max_weight == 0.0 || max_change / max_weight <= tol {
            return Ok(w);
        }

        if epoch + 1 == max_iter {
            warn!(
                solver = if saga { "saga" } else { "sag" },
                max_iter,
                "Stochastic solver reached max_iter before converging"
            );
        }
    }

    Ok(w)
}

fn check_finite(w: &Array1<f64>, solver: &str) -> Result<()> {
    if w.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(WineError::ComputationError(format!(
            "Solver '{}' diverged to non-finite coefficients",
            solver
        )))
    }
}
