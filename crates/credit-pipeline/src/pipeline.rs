//! Stage composition.
//!
//! Records flow strictly forward: parse → normalize → aggregate → target →
//! score. Every intermediate is returned in [`PipelineOutput`] so callers and
//! tests can inspect any stage without rerunning it.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use credit_core::error::CreditResult;
use credit_core::normalize::{normalize_all, parse_records, NormalizeOutcome};
use credit_core::types::WalletFeatureVector;
use credit_features::{aggregate_sanitized, build_targets, SyntheticTarget};
use credit_model::{score, CvSummary, ScoreReport};

use crate::config::PipelineConfig;
use crate::loader::load_records;

/// Counts worth reporting once a run finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub wallets: usize,
    pub bad_timestamps: usize,
    pub bad_amounts: usize,
    pub bad_prices: usize,
    /// Feature values the sanitize step replaced with zero.
    pub sanitized_features: usize,
    pub degenerate_target: bool,
    pub cv: Option<CvSummary>,
}

impl RunSummary {
    /// Emit the summary as a single `info` event.
    pub fn log(&self) {
        let (cv_mean, cv_std) = self
            .cv
            .as_ref()
            .map_or((f64::NAN, f64::NAN), |cv| (cv.mean, cv.std));
        info!(
            records = self.records,
            wallets = self.wallets,
            bad_timestamps = self.bad_timestamps,
            bad_amounts = self.bad_amounts,
            bad_prices = self.bad_prices,
            sanitized_features = self.sanitized_features,
            degenerate_target = self.degenerate_target,
            cv_mean,
            cv_std,
            "pipeline: run complete"
        );
    }
}

/// Every stage's output for one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub normalized: NormalizeOutcome,
    pub features: Vec<WalletFeatureVector>,
    pub target: SyntheticTarget,
    pub report: ScoreReport,
    pub summary: RunSummary,
}

/// Run all stages over already-parsed JSON records.
///
/// Fails on the first schema or model error; recoverable data problems are
/// counted in [`RunSummary`] instead.
pub fn run_pipeline(records: &[Value], config: &PipelineConfig) -> CreditResult<PipelineOutput> {
    config.validate()?;

    let raw = parse_records(records)?;
    info!(records = raw.len(), "pipeline: records validated");

    let normalized = normalize_all(&raw);

    let sanitized = aggregate_sanitized(&normalized.transactions);
    let features = sanitized.value;
    info!(wallets = features.len(), "pipeline: features aggregated");

    let target = build_targets(&features);
    let report = score(&features, &target.values, &config.scorer_config())?;
    info!(scored = report.scores.len(), "pipeline: wallets scored");

    let summary = RunSummary {
        records: records.len(),
        wallets: features.len(),
        bad_timestamps: normalized.bad_timestamps,
        bad_amounts: normalized.bad_amounts,
        bad_prices: normalized.bad_prices,
        sanitized_features: sanitized.replaced,
        degenerate_target: target.degenerate,
        cv: report.cv.clone(),
    };
    summary.log();

    Ok(PipelineOutput {
        normalized,
        features,
        target,
        report,
        summary,
    })
}

/// Load `path` and run all stages.
pub fn run_file(path: &Path, config: &PipelineConfig) -> CreditResult<PipelineOutput> {
    let records = load_records(path)?;
    run_pipeline(&records, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_core::error::{CreditError, SchemaError};
    use serde_json::json;

    fn record(wallet: &str, action: &str, ts: i64, amount: &str, price: f64) -> Value {
        json!({
            "userWallet": wallet,
            "network": "polygon",
            "protocol": "aave_v2",
            "txHash": format!("0x{ts:x}"),
            "timestamp": ts,
            "action": action,
            "actionData": {
                "type": action,
                "amount": amount,
                "assetSymbol": "USDC",
                "assetPriceUSD": price.to_string(),
            },
        })
    }

    fn fast_config() -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.model.n_estimators = 10;
        cfg
    }

    fn ledger() -> Vec<Value> {
        let mut out = Vec::new();
        for w in 0..12i64 {
            let wallet = format!("0x{w:040x}");
            for i in 0..=(w % 4) {
                let action = ["deposit", "borrow", "repay", "deposit"][i as usize];
                out.push(record(&wallet, action, 1_600_000_000 + w * 1_000 + i * 86_400, "100", 1.0 + w as f64));
            }
            if w == 5 {
                out.push(record(&wallet, "liquidationcall", 1_700_000_000, "5", 1.0));
            }
        }
        out
    }

    #[test]
    fn end_to_end_scores_every_wallet() {
        let out = run_pipeline(&ledger(), &fast_config()).unwrap();
        assert_eq!(out.summary.wallets, 12);
        assert_eq!(out.report.scores.len(), 12);
        assert_eq!(out.summary.records, out.normalized.transactions.len());
        assert!(out
            .report
            .scores
            .iter()
            .all(|s| (0.0..=1000.0).contains(&s.credit_score)));
        assert!(out.summary.cv.is_some());
        assert!(!out.summary.degenerate_target);
    }

    #[test]
    fn wallets_come_out_sorted() {
        let mut records = ledger();
        records.reverse();
        let out = run_pipeline(&records, &fast_config()).unwrap();
        let wallets: Vec<&str> = out.report.scores.iter().map(|s| s.wallet.as_str()).collect();
        let mut sorted = wallets.clone();
        sorted.sort();
        assert_eq!(wallets, sorted);
    }

    #[test]
    fn rerun_is_identical() {
        let a = run_pipeline(&ledger(), &fast_config()).unwrap();
        let b = run_pipeline(&ledger(), &fast_config()).unwrap();
        assert_eq!(a.features, b.features);
        assert_eq!(a.target, b.target);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn coercions_are_counted_not_fatal() {
        let mut records = ledger();
        records.push(json!({
            "userWallet": "0xbad",
            "txHash": "0x1",
            "timestamp": "not a time",
            "action": "deposit",
            "actionData": {"amount": "lots", "assetSymbol": "DAI", "assetPriceUSD": "?"},
        }));
        let out = run_pipeline(&records, &fast_config()).unwrap();
        assert_eq!(out.summary.bad_timestamps, 1);
        assert_eq!(out.summary.bad_amounts, 1);
        assert_eq!(out.summary.bad_prices, 1);
        assert_eq!(out.summary.wallets, 13);
    }

    #[test]
    fn missing_field_aborts_run() {
        let mut records = ledger();
        records.push(json!({"userWallet": "0x1", "action": "deposit"}));
        let err = run_pipeline(&records, &fast_config()).unwrap_err();
        assert!(matches!(
            err,
            CreditError::Schema(SchemaError::MissingFields { .. })
        ));
    }

    #[test]
    fn empty_ledger_gives_empty_output() {
        let out = run_pipeline(&[], &fast_config()).unwrap();
        assert!(out.features.is_empty());
        assert!(out.report.scores.is_empty());
        assert!(out.summary.cv.is_none());
    }

    #[test]
    fn invalid_config_rejected_before_parsing() {
        let mut cfg = fast_config();
        cfg.model.cv_folds = 0;
        assert!(matches!(
            run_pipeline(&ledger(), &cfg),
            Err(CreditError::Config(_))
        ));
    }

    #[test]
    fn run_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, serde_json::to_string(&ledger()).unwrap()).unwrap();
        let out = run_file(&path, &fast_config()).unwrap();
        assert_eq!(out.report.scores.len(), 12);
    }
}
