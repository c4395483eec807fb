//! K-fold cross-validation and the R² metric.
//!
//! Folds are contiguous and unshuffled, in row order. When `n` does not divide
//! evenly the first `n % k` folds take one extra row.

use tracing::debug;

use credit_core::error::ModelError;
use credit_core::traits::{check_training_set, Regressor};

/// Train/test index pairs for contiguous K-fold splitting.
///
/// Returns an empty list when `k == 0` or `k > n`.
///
/// ```
/// use credit_model::kfold_indices;
///
/// let folds = kfold_indices(7, 3);
/// assert_eq!(folds[0].1, vec![0, 1, 2]);
/// assert_eq!(folds[1].1, vec![3, 4]);
/// assert_eq!(folds[2].1, vec![5, 6]);
/// assert_eq!(folds[2].0, vec![0, 1, 2, 3, 4]);
/// ```
pub fn kfold_indices(n: usize, k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    if k == 0 || k > n {
        return Vec::new();
    }
    let base = n / k;
    let extra = n % k;

    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let test: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n).collect();
        folds.push((train, test));
        start = end;
    }
    folds
}

/// Coefficient of determination.
///
/// With constant `truth` the score is `1.0` for a perfect prediction and
/// `0.0` otherwise. Empty or mismatched inputs score `0.0`.
pub fn r2_score(truth: &[f64], pred: &[f64]) -> f64 {
    if truth.is_empty() || truth.len() != pred.len() {
        return 0.0;
    }
    let mean = truth.iter().sum::<f64>() / truth.len() as f64;
    let ss_res: f64 = truth.iter().zip(pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Per-fold R² plus summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CvSummary {
    pub folds: usize,
    pub scores: Vec<f64>,
    pub mean: f64,
    /// Population standard deviation of `scores`.
    pub std: f64,
}

impl CvSummary {
    fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            folds: scores.len(),
            scores,
            mean,
            std: var.sqrt(),
        }
    }
}

fn select<T: Clone>(values: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| values[i].clone()).collect()
}

/// Cross-validate a fresh model per fold.
///
/// `folds` is capped at the row count. Returns `Ok(None)` with fewer than two
/// rows, since no split leaves both a train and a test side.
pub fn cross_validate<R, F>(
    make: F,
    features: &[Vec<f64>],
    target: &[f64],
    folds: usize,
) -> Result<Option<CvSummary>, ModelError>
where
    R: Regressor,
    F: Fn() -> Result<R, ModelError>,
{
    if folds < 2 {
        return Err(ModelError::InvalidConfig(format!(
            "cv_folds must be >= 2, got {folds}"
        )));
    }
    check_training_set(features, target)?;
    let n = features.len();
    if n < 2 {
        return Ok(None);
    }

    let k = folds.min(n);
    let mut scores = Vec::with_capacity(k);
    for (fold, (train, test)) in kfold_indices(n, k).into_iter().enumerate() {
        let mut model = make()?;
        model.fit(&select(features, &train), &select(target, &train))?;
        let pred = model.predict(&select(features, &test))?;
        let r2 = r2_score(&select(target, &test), &pred);
        debug!(fold, train = train.len(), test = test.len(), r2, "cv: fold scored");
        scores.push(r2);
    }

    Ok(Some(CvSummary::from_scores(scores)))
}
