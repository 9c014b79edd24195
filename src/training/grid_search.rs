//! Exhaustive hyperparameter search for ridge regression

use super::cross_validation::{CVResults, CrossValidator};
use super::linear_models::{RidgeRegression, RidgeSolver};
use super::models::{mean_squared_error, Regressor};
use crate::error::{Result, WineError};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// One point of the ridge hyperparameter grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RidgeParams {
    pub alpha: f64,
    pub fit_intercept: bool,
    pub solver: RidgeSolver,
}

impl RidgeParams {
    /// Unfitted estimator configured with these parameters
    pub fn build(&self, random_state: u64) -> RidgeRegression {
        RidgeRegression::new(self.alpha)
            .with_fit_intercept(self.fit_intercept)
            .with_solver(self.solver)
            .with_random_state(random_state)
    }

    /// Parameters as logged to the experiment tracker
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("alpha".to_string(), self.alpha.to_string());
        map.insert("fit_intercept".to_string(), self.fit_intercept.to_string());
        map.insert("solver".to_string(), self.solver.to_string());
        map
    }
}

/// Cartesian product of candidate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub alpha: Vec<f64>,
    pub fit_intercept: Vec<bool>,
    pub solver: Vec<RidgeSolver>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            alpha: vec![0.1, 1.0, 10.0],
            fit_intercept: vec![true, false],
            solver: RidgeSolver::ALL.to_vec(),
        }
    }
}

impl ParamGrid {
    /// Expand the grid; `alpha` varies slowest and `solver` fastest.
    pub fn candidates(&self) -> Vec<RidgeParams> {
        let mut out = Vec::with_capacity(self.len());
        for &alpha in &self.alpha {
            for &fit_intercept in &self.fit_intercept {
                for &solver in &self.solver {
                    out.push(RidgeParams {
                        alpha,
                        fit_intercept,
                        solver,
                    });
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.alpha.len() * self.fit_intercept.len() * self.solver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cross-validated score of a single candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: RidgeParams,
    /// Fold scores are negated mean squared errors
    pub cv: CVResults,
}

/// Outcome of [`GridSearch::fit`]
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best_params: RidgeParams,
    /// Mean negated MSE of the winning candidate
    pub best_score: f64,
    pub best_index: usize,
    /// Every candidate in grid order
    pub candidates: Vec<CandidateScore>,
    /// Winner refit on the full training data
    pub best_estimator: RidgeRegression,
    pub duration_secs: f64,
}

/// Grid search over [`ParamGrid`] scored by k-fold negated mean squared error
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    cv: CrossValidator,
    random_state: u64,
}

impl GridSearch {
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            cv: CrossValidator::k_fold(5),
            random_state: 0,
        }
    }

    /// Seed handed to the stochastic solvers
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<GridSearchResult> {
        if self.grid.is_empty() {
            return Err(WineError::ConfigError("Parameter grid is empty".to_string()));
        }

        let start = Instant::now();
        let splits = self.cv.split(x.nrows())?;
        let candidates = self.grid.candidates();

        info!(
            n_candidates = candidates.len(),
            n_folds = splits.len(),
            "Starting grid search"
        );

        // folds are materialized once and shared read-only across workers
        let folds: Vec<_> = splits
            .iter()
            .map(|s| {
                (
                    x.select(Axis(0), &s.train_indices),
                    y.select(Axis(0), &s.train_indices),
                    x.select(Axis(0), &s.test_indices),
                    y.select(Axis(0), &s.test_indices),
                )
            })
            .collect();

        let scored: Vec<CandidateScore> = candidates
            .par_iter()
            .map(|params| {
                let scores = folds
                    .iter()
                    .map(|(x_train, y_train, x_val, y_val)| {
                        let mut model = params.build(self.random_state);
                        model.fit(x_train, y_train)?;
                        let pred = model.predict(x_val)?;
                        Ok(-mean_squared_error(y_val, &pred))
                    })
                    .collect::<Result<Vec<f64>>>()?;

                let cv = CVResults::from_scores(scores);
                debug!(
                    alpha = params.alpha,
                    fit_intercept = params.fit_intercept,
                    solver = %params.solver,
                    mean_score = cv.mean_score,
                    "Candidate scored"
                );
                Ok(CandidateScore {
                    params: *params,
                    cv,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let best_index = select_best(&scored);
        let best = &scored[best_index];

        let mut best_estimator = best.params.build(self.random_state);
        best_estimator.fit(x, y)?;

        let duration_secs = start.elapsed().as_secs_f64();
        info!(
            best_index,
            best_score = best.cv.mean_score,
            solver = %best.params.solver,
            duration_secs,
            "Grid search complete"
        );

        Ok(GridSearchResult {
            best_params: best.params,
            best_score: best.cv.mean_score,
            best_index,
            best_estimator,
            candidates: scored,
            duration_secs,
        })
    }
}

/// Highest mean score wins; ties keep the earliest candidate and NaN never wins.
fn select_best(scored: &[CandidateScore]) -> usize {
    let mut best_idx = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, candidate) in scored.iter().enumerate() {
        let value = candidate.cv.mean_score;
        if value > best_val {
            best_val = value;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn synthetic(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array::from_shape_fn((n, 3), |(r, c)| ((r * 7 + c * 3) % 11) as f64 / 11.0 + c as f64);
        let y = x.map_axis(Axis(1), |row| 2.0 * row[0] - row[1] + 0.5 * row[2] + 4.0);
        (x, y)
    }

    #[test]
    fn test_grid_order() {
        let grid = ParamGrid::default();
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 42);
        assert_eq!(
            candidates[0],
            RidgeParams {
                alpha: 0.1,
                fit_intercept: true,
                solver: RidgeSolver::Auto
            }
        );
        assert_eq!(candidates[1].solver, RidgeSolver::ALL[1]);
        assert!(!candidates[7].fit_intercept);
        assert_eq!(candidates[14].alpha, 1.0);
    }

    #[test]
    fn test_select_best_prefers_first_on_tie_and_skips_nan() {
        let score = |v: f64| CandidateScore {
            params: ParamGrid::default().candidates()[0],
            cv: CVResults::from_scores(vec![v]),
        };
        let scored = vec![score(f64::NAN), score(-2.0), score(-1.0), score(-1.0)];
        assert_eq!(select_best(&scored), 2);
    }

    #[test]
    fn test_grid_search_finds_small_alpha_with_intercept() {
        let (x, y) = synthetic(60);
        let grid = ParamGrid {
            alpha: vec![0.001, 100.0],
            fit_intercept: vec![true, false],
            solver: vec![RidgeSolver::Cholesky],
        };
        let result = GridSearch::new(grid).fit(&x, &y).unwrap();

        assert_eq!(result.candidates.len(), 4);
        assert_eq!(result.best_index, 0);
        assert_eq!(result.best_params.alpha, 0.001);
        assert!(result.best_params.fit_intercept);
        assert!(result.best_score <= 0.0);
        assert!(result.best_estimator.is_fitted);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let (x, y) = synthetic(20);
        let grid = ParamGrid {
            alpha: vec![],
            ..ParamGrid::default()
        };
        assert!(GridSearch::new(grid).fit(&x, &y).is_err());
    }
}
