//! Scoring stage: standardize, fit, cross-validate, predict, clip.
//!
//! The model is fit on every wallet and then asked to predict those same
//! wallets, so the scores are in-sample smoothings of the synthetic target.
//! Cross-validation is a diagnostic only and never changes a score.

use tracing::{info, warn};

use credit_core::constants::DEFAULT_CV_FOLDS;
use credit_core::error::ModelError;
use credit_core::sanitize::clip_score;
use credit_core::traits::Regressor;
use credit_core::types::{feature_matrix, ScoredWallet, WalletFeatureVector};

use crate::forest::{ForestParams, RandomForestRegressor};
use crate::scaler::StandardScaler;
use crate::validation::{cross_validate, CvSummary};

/// Model and validation settings for [`score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorerConfig {
    pub forest: ForestParams,
    pub cv_folds: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            cv_folds: DEFAULT_CV_FOLDS,
        }
    }
}

/// Output of the scoring stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    /// One entry per input row, same order.
    pub scores: Vec<ScoredWallet>,
    /// `None` when the population was too small to cross-validate.
    pub cv: Option<CvSummary>,
    /// `None` for an empty population.
    pub scaler: Option<StandardScaler>,
}

impl ScoreReport {
    fn empty() -> Self {
        Self {
            scores: Vec::new(),
            cv: None,
            scaler: None,
        }
    }
}

/// Score wallets with the default random forest.
pub fn score(
    rows: &[WalletFeatureVector],
    target: &[f64],
    config: &ScorerConfig,
) -> Result<ScoreReport, ModelError> {
    config.forest.validate()?;
    let params = config.forest;
    score_with(rows, target, config.cv_folds, || {
        RandomForestRegressor::new(params)
    })
}

/// Score wallets with any [`Regressor`] built by `make`.
///
/// `make` is called once for the final model and once per CV fold.
pub fn score_with<R, F>(
    rows: &[WalletFeatureVector],
    target: &[f64],
    cv_folds: usize,
    make: F,
) -> Result<ScoreReport, ModelError>
where
    R: Regressor,
    F: Fn() -> Result<R, ModelError>,
{
    if rows.len() != target.len() {
        return Err(ModelError::ShapeMismatch {
            rows: rows.len(),
            targets: target.len(),
        });
    }
    if rows.is_empty() {
        warn!("scorer: no wallets to score");
        return Ok(ScoreReport::empty());
    }

    let (scaler, x) = StandardScaler::fit_transform(&feature_matrix(rows))?;

    let mut model = make()?;
    model.fit(&x, target)?;

    let cv = cross_validate(&make, &x, target, cv_folds)?;
    match &cv {
        Some(s) => info!(
            folds = s.folds,
            "cross-validation R²: {:.4} (±{:.4})",
            s.mean,
            s.std
        ),
        None => warn!(wallets = rows.len(), "scorer: too few wallets for cross-validation"),
    }

    let predictions = model.predict(&x)?;
    let scores = rows
        .iter()
        .zip(predictions)
        .map(|(row, p)| ScoredWallet {
            wallet: row.wallet.clone(),
            credit_score: clip_score(p),
        })
        .collect();

    Ok(ScoreReport {
        scores,
        cv,
        scaler: Some(scaler),
    })
}
