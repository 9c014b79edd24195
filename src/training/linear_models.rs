//! Linear model implementations

use crate::error::{Result, WineError};
use super::models::Regressor;
use super::solvers;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numerical strategy used to fit a ridge model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RidgeSolver {
    /// Cholesky, falling back to the spectral solve when the system is ill-conditioned
    Auto,
    Svd,
    Cholesky,
    Lsqr,
    SparseCg,
    Sag,
    Saga,
}

impl RidgeSolver {
    /// Every solver, in the order the tuning grid enumerates them
    pub const ALL: [RidgeSolver; 7] = [
        RidgeSolver::Auto,
        RidgeSolver::Svd,
        RidgeSolver::Cholesky,
        RidgeSolver::Lsqr,
        RidgeSolver::SparseCg,
        RidgeSolver::Sag,
        RidgeSolver::Saga,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RidgeSolver::Auto => "auto",
            RidgeSolver::Svd => "svd",
            RidgeSolver::Cholesky => "cholesky",
            RidgeSolver::Lsqr => "lsqr",
            RidgeSolver::SparseCg => "sparse_cg",
            RidgeSolver::Sag => "sag",
            RidgeSolver::Saga => "saga",
        }
    }
}

impl fmt::Display for RidgeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RidgeSolver {
    type Err = WineError;

    fn from_str(s: &str) -> Result<Self> {
        RidgeSolver::ALL
            .into_iter()
            .find(|solver| solver.as_str() == s)
            .ok_or_else(|| WineError::InvalidParameter {
                name: "solver".to_string(),
                value: s.to_string(),
                reason: "unknown ridge solver".to_string(),
            })
    }
}

/// Column means of X and mean of y, used to center data when fitting an intercept
fn center(x: &mut Array2<f64>, y: &Array1<f64>) -> Result<(Array1<f64>, f64, Array1<f64>)> {
    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| WineError::DataError("Cannot fit on zero samples".to_string()))?;
    let y_mean = y.mean().unwrap_or(0.0);

    *x -= &x_mean.view().insert_axis(Axis(0));
    let y_centered = y - y_mean;
    Ok((x_mean, y_mean, y_centered))
}

fn check_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(WineError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(WineError::DataError("Cannot fit on zero samples".to_string()));
    }
    Ok(())
}

fn linear_predict(
    coefficients: &Option<Array1<f64>>,
    intercept: Option<f64>,
    x: &Array2<f64>,
) -> Result<Array1<f64>> {
    let coefficients = coefficients.as_ref().ok_or(WineError::ModelNotFitted)?;
    if x.ncols() != coefficients.len() {
        return Err(WineError::ShapeError {
            expected: format!("{} features", coefficients.len()),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(x.dot(coefficients) + intercept.unwrap_or(0.0))
}

/// Ordinary least squares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    /// When false, callers hand the training matrix over through
    /// [`LinearRegression::fit_in_place`] and it is centered without a copy
    pub copy_x: bool,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            copy_x: true,
            is_fitted: false,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn with_copy_x(mut self, copy_x: bool) -> Self {
        self.copy_x = copy_x;
        self
    }

    /// Fit on a matrix the caller gives up; it is left centered when an intercept is fit.
    pub fn fit_in_place(&mut self, x: &mut Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_shapes(x, y)?;

        let (coefficients, intercept) = if self.fit_intercept {
            let (x_mean, y_mean, y_centered) = center(x, y)?;
            let w = solvers::solve_cholesky(x, &y_centered, 0.0)
                .or_else(|_| solvers::solve_svd(x, &y_centered, 0.0))?;
            let b = y_mean - w.dot(&x_mean);
            (w, b)
        } else {
            let w = solvers::solve_cholesky(x, y, 0.0).or_else(|_| solvers::solve_svd(x, y, 0.0))?;
            (w, 0.0)
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;
        Ok(self)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let mut owned = x.to_owned();
        self.fit_in_place(&mut owned, y)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(WineError::ModelNotFitted);
        }
        linear_predict(&self.coefficients, self.intercept, x)
    }
}

/// Default iteration cap for the iterative solvers
pub const DEFAULT_MAX_ITER: usize = 1000;
/// Default convergence tolerance for the iterative solvers
pub const DEFAULT_TOL: f64 = 1e-4;

/// Ridge Regression (L2-regularized linear regression)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    pub fit_intercept: bool,
    /// L2 regularization strength
    pub alpha: f64,
    pub solver: RidgeSolver,
    pub max_iter: usize,
    pub tol: f64,
    /// Seed for the stochastic solvers
    pub random_state: u64,
    pub is_fitted: bool,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            alpha,
            solver: RidgeSolver::Auto,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
            random_state: 0,
            is_fitted: false,
        }
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn with_solver(mut self, solver: RidgeSolver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn solve(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let alpha = self.alpha;
        match self.solver {
            RidgeSolver::Auto => {
                solvers::solve_cholesky(x, y, alpha).or_else(|_| solvers::solve_svd(x, y, alpha))
            }
            RidgeSolver::Svd => solvers::solve_svd(x, y, alpha),
            RidgeSolver::Cholesky => solvers::solve_cholesky(x, y, alpha),
            RidgeSolver::Lsqr => solvers::solve_lsqr(x, y, alpha, self.max_iter, self.tol),
            RidgeSolver::SparseCg => solvers::solve_sparse_cg(x, y, alpha, self.max_iter, self.tol),
            RidgeSolver::Sag => {
                solvers::solve_sag(x, y, alpha, self.max_iter, self.tol, self.random_state, false)
            }
            RidgeSolver::Saga => {
                solvers::solve_sag(x, y, alpha, self.max_iter, self.tol, self.random_state, true)
            }
        }
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(WineError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be a finite non-negative number".to_string(),
            });
        }

        let (coefficients, intercept) = if self.fit_intercept {
            let mut x_c = x.to_owned();
            let (x_mean, y_mean, y_c) = center(&mut x_c, y)?;
            let w = self.solve(&x_c, &y_c)?;
            let b = y_mean - w.dot(&x_mean);
            (w, b)
        } else {
            (self.solve(x, y)?, 0.0)
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(WineError::ModelNotFitted);
        }
        linear_predict(&self.coefficients, self.intercept, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn plane() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 2.0],
            [3.0, 1.0],
        ];
        // y = 2*x1 + 3*x2 + 1
        let y = array![6.0, 8.0, 9.0, 11.0, 10.0];
        (x, y)
    }

    #[test]
    fn test_linear_regression_simple() {
        let (x, y) = plane();

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        assert!(model.is_fitted);
        assert!((model.intercept.unwrap() - 1.0).abs() < 1e-8);
        let r2 = crate::training::r2_score(&y, &model.predict(&x).unwrap());
        assert!(r2 > 0.99, "R² should be close to 1, got {}", r2);
    }

    #[test]
    fn test_linear_regression_without_intercept() {
        let (x, y) = plane();
        let mut model = LinearRegression::new().with_fit_intercept(false);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.intercept, Some(0.0));
    }

    #[test]
    fn test_fit_in_place_matches_copying_fit() {
        let (x, y) = plane();
        let mut copying = LinearRegression::new();
        copying.fit(&x, &y).unwrap();

        let mut handed_over = x.clone();
        let mut in_place = LinearRegression::new().with_copy_x(false);
        in_place.fit_in_place(&mut handed_over, &y).unwrap();

        assert_ne!(handed_over, x, "matrix should have been centered in place");
        let a = copying.predict(&x).unwrap();
        let b = in_place.predict(&x).unwrap();
        for (u, v) in a.iter().zip(b.iter()) {
            assert!((u - v).abs() < 1e-10);
        }
    }

    #[test]
    fn test_ridge_solvers_agree() {
        let (x, y) = plane();
        let mut reference = RidgeRegression::new(1.0).with_solver(RidgeSolver::Cholesky);
        reference.fit(&x, &y).unwrap();
        let expected = reference.predict(&x).unwrap();

        for solver in RidgeSolver::ALL {
            let mut model = RidgeRegression::new(1.0)
                .with_solver(solver)
                .with_max_iter(20_000)
                .with_random_state(3);
            model.tol = 1e-10;
            model.fit(&x, &y).unwrap();
            let predicted = model.predict(&x).unwrap();
            for (u, v) in predicted.iter().zip(expected.iter()) {
                assert!((u - v).abs() < 1e-2, "solver {} diverged: {} vs {}", solver, u, v);
            }
        }
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let (x, y) = plane();
        let mut weak = RidgeRegression::new(0.01);
        let mut strong = RidgeRegression::new(100.0);
        weak.fit(&x, &y).unwrap();
        strong.fit(&x, &y).unwrap();

        let norm = |m: &RidgeRegression| m.coefficients.as_ref().unwrap().mapv(|v| v * v).sum();
        assert!(norm(&strong) < norm(&weak));
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let model = RidgeRegression::default();
        assert!(matches!(model.predict(&array![[1.0, 2.0]]), Err(WineError::ModelNotFitted)));
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let (x, y) = plane();
        let mut model = RidgeRegression::new(-1.0);
        assert!(matches!(model.fit(&x, &y), Err(WineError::InvalidParameter { .. })));
    }

    #[test]
    fn test_solver_names_round_trip() {
        for solver in RidgeSolver::ALL {
            assert_eq!(solver.as_str().parse::<RidgeSolver>().unwrap(), solver);
        }
        assert!("newton".parse::<RidgeSolver>().is_err());
    }
}
