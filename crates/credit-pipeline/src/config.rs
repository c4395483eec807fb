//! Pipeline configuration.
//!
//! Layered with the `config` crate: struct defaults, then an optional file
//! (TOML, JSON, YAML; picked by extension), then `CREDIT__*` environment
//! variables such as `CREDIT__MODEL__SEED=7`. The binary applies CLI flags on
//! top of the loaded value.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use credit_core::constants::{
    DEFAULT_CV_FOLDS, DEFAULT_MIN_SAMPLES_LEAF, DEFAULT_MIN_SAMPLES_SPLIT, DEFAULT_N_ESTIMATORS,
    DEFAULT_SEED,
};
use credit_core::error::{CreditError, CreditResult};
use credit_model::{ForestParams, ScorerConfig, TreeParams};

/// Environment variable prefix; nested keys are joined with `__`.
pub const ENV_PREFIX: &str = "CREDIT";

/// Top-level configuration for one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: ModelConfig,
    pub output: OutputConfig,
    /// Log level filter string (e.g. "info", "debug", "credit_model=trace").
    pub log_level: String,
}

/// Random forest and cross-validation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_estimators: usize,
    pub seed: u64,
    pub cv_folds: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// Where report files are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub scores_file: String,
    pub histogram_file: String,
    /// Per-wallet feature table; skipped when unset.
    pub features_file: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            output: OutputConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            seed: DEFAULT_SEED,
            cv_folds: DEFAULT_CV_FOLDS,
            max_depth: None,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            scores_file: "wallet_scores.csv".to_string(),
            histogram_file: "score_distribution.svg".to_string(),
            features_file: None,
        }
    }
}

impl PipelineConfig {
    /// Load defaults, an optional config file and `CREDIT__*` overrides.
    ///
    /// A `path` that is given must exist. The result is validated.
    pub fn load(path: Option<&Path>) -> CreditResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CreditError::Config(e.to_string()))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| CreditError::Config(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject settings the model cannot run with.
    pub fn validate(&self) -> CreditResult<()> {
        let m = &self.model;
        if m.n_estimators == 0 {
            return Err(CreditError::Config("model.n_estimators must be >= 1".into()));
        }
        if m.cv_folds < 2 {
            return Err(CreditError::Config(format!(
                "model.cv_folds must be >= 2, got {}",
                m.cv_folds
            )));
        }
        if m.min_samples_split < 2 {
            return Err(CreditError::Config(format!(
                "model.min_samples_split must be >= 2, got {}",
                m.min_samples_split
            )));
        }
        if m.min_samples_leaf < 1 {
            return Err(CreditError::Config("model.min_samples_leaf must be >= 1".into()));
        }
        if m.max_depth == Some(0) {
            return Err(CreditError::Config("model.max_depth must be >= 1".into()));
        }
        Ok(())
    }

    /// Model settings in the form the scorer takes.
    pub fn scorer_config(&self) -> ScorerConfig {
        let m = &self.model;
        ScorerConfig {
            forest: ForestParams {
                n_estimators: m.n_estimators,
                seed: m.seed,
                bootstrap: true,
                tree: TreeParams {
                    max_depth: m.max_depth,
                    min_samples_split: m.min_samples_split,
                    min_samples_leaf: m.min_samples_leaf,
                    max_features: None,
                },
            },
            cv_folds: m.cv_folds,
        }
    }
}

impl OutputConfig {
    pub fn scores_path(&self) -> PathBuf {
        self.dir.join(&self.scores_file)
    }

    pub fn histogram_path(&self) -> PathBuf {
        self.dir.join(&self.histogram_file)
    }

    pub fn features_path(&self) -> Option<PathBuf> {
        self.features_file.as_ref().map(|f| self.dir.join(f))
    }
}
