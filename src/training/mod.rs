//! Model training module
//!
//! Provides the offline side of the service:
//! - Closed-form and iterative ridge solvers
//! - Ordinary least squares and ridge regression estimators
//! - K-fold cross-validation and exhaustive grid search
//! - Seeded train/test partitioning and regression metrics

mod models;
mod solvers;
pub mod cross_validation;
pub mod dataset;
pub mod grid_search;
pub mod linear_models;

pub use cross_validation::{CrossValidator, CVStrategy, CVSplit, CVResults};
pub use dataset::{Dataset, TrainTestSplit};
pub use grid_search::{CandidateScore, GridSearch, GridSearchResult, ParamGrid, RidgeParams};
pub use linear_models::{LinearRegression, RidgeRegression, RidgeSolver};
pub use models::{mean_absolute_error, mean_squared_error, r2_score, ModelMetrics, Regressor};
pub use solvers::{solve_cholesky, solve_lsqr, solve_sag, solve_sparse_cg, solve_svd};
