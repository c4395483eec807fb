//! Trait interfaces for the scoring stage.
//!
//! - [`Regressor`]: fit/predict model capability (credit-model implements)

use crate::error::ModelError;

/// A supervised regression model over a dense row-major feature matrix.
///
/// The scorer only relies on these two operations, so the concrete
/// algorithm can be swapped without touching the scoring contract.
pub trait Regressor: Send {
    /// Train on `features` (one row per sample) against `target`.
    ///
    /// Refitting discards any previously learned state.
    fn fit(&mut self, features: &[Vec<f64>], target: &[f64]) -> Result<(), ModelError>;

    /// Predict one value per row. Fails with [`ModelError::NotFitted`]
    /// before a successful [`fit`](Self::fit).
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

/// Check that a training set is non-empty, rectangular, and that the target
/// has one value per row. Returns the column count.
pub fn check_training_set(features: &[Vec<f64>], target: &[f64]) -> Result<usize, ModelError> {
    if features.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if features.len() != target.len() {
        return Err(ModelError::ShapeMismatch {
            rows: features.len(),
            targets: target.len(),
        });
    }
    check_rectangular(features, features[0].len())?;
    Ok(features[0].len())
}

/// Check that every row has exactly `expected` columns.
pub fn check_rectangular(features: &[Vec<f64>], expected: usize) -> Result<(), ModelError> {
    for (row, values) in features.iter().enumerate() {
        if values.len() != expected {
            return Err(ModelError::RaggedRow {
                row,
                got: values.len(),
                expected,
            });
        }
    }
    Ok(())
}
