//! # credit-model: from feature table to bounded credit scores.
//!
//! - **Scaling**: [`StandardScaler`] standardizes each feature column to zero
//!   mean and unit variance across the wallet population.
//! - **Regression**: [`RandomForestRegressor`] is a seeded bagged ensemble of
//!   CART trees implementing [`Regressor`](credit_core::traits::Regressor).
//! - **Validation**: contiguous K-fold cross-validation with R² scoring,
//!   reported as a diagnostic only.
//! - **Scoring**: fit on the whole population, predict in-sample, clip to
//!   `[0, 1000]`.

pub mod forest;
pub mod scaler;
pub mod scorer;
pub mod tree;
pub mod validation;

pub use forest::{ForestParams, RandomForestRegressor};
pub use scaler::StandardScaler;
pub use scorer::{score, score_with, ScoreReport, ScorerConfig};
pub use tree::{RegressionTree, TreeParams};
pub use validation::{cross_validate, kfold_indices, r2_score, CvSummary};
