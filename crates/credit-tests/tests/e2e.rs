//! End-to-end tests: JSON ledger on disk → scores, histogram and features on
//! disk.
//!
//! Covers:
//! - Full run with report files and CSV header
//! - Byte-identical output on rerun
//! - Fatal schema errors (missing fields, non-array input)
//! - The two-transaction deposit/repay wallet
//! - Zero-deposit debt ratio and liquidation monotonicity
//! - Single-wallet population (degenerate target)

use std::fs;

use credit_core::error::{CreditError, SchemaError};
use credit_core::types::ActionKind;
use credit_features::{aggregate, build_targets};
use credit_pipeline::{run_file, run_pipeline, write_reports};
use credit_tests::helpers::*;

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[test]
fn e2e_scores_csv_and_histogram_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_ledger(dir.path(), "ledger.json", &ledger(40));
    let config = fast_config(&dir.path().join("out"));

    let output = run_file(&input, &config).unwrap();
    let written = write_reports(&output, &config.output).unwrap();
    assert_eq!(written.len(), 2);

    let csv = fs::read_to_string(config.output.scores_path()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("userWallet,credit_score"));

    let rows: Vec<(String, f64)> = lines
        .map(|l| {
            let (w, s) = l.split_once(',').unwrap();
            (w.to_string(), s.parse().unwrap())
        })
        .collect();
    assert_eq!(rows.len(), 40);
    assert!(rows.iter().all(|(_, s)| (0.0..=1000.0).contains(s)));
    assert_eq!(rows[0].0, wallet(0));

    let svg = fs::read_to_string(config.output.histogram_path()).unwrap();
    assert!(svg.contains("Credit Score Distribution"));

    let cv = output.summary.cv.unwrap();
    assert_eq!(cv.folds, 5);
    assert!(cv.mean.is_finite());
}

#[test]
fn e2e_features_csv_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_ledger(dir.path(), "ledger.json", &ledger(10));
    let mut config = fast_config(dir.path());
    config.output.features_file = Some("features.csv".into());

    let output = run_file(&input, &config).unwrap();
    let written = write_reports(&output, &config.output).unwrap();
    assert_eq!(written.len(), 3);

    let body = fs::read_to_string(dir.path().join("features.csv")).unwrap();
    assert_eq!(body.lines().count(), 11);
    assert!(body.starts_with("userWallet,total_txs,num_deposits"));
}

#[test]
fn e2e_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_ledger(dir.path(), "ledger.json", &ledger(25));

    let mut outputs = Vec::new();
    for run in ["a", "b"] {
        let config = fast_config(&dir.path().join(run));
        let output = run_file(&input, &config).unwrap();
        write_reports(&output, &config.output).unwrap();
        outputs.push(fs::read(config.output.scores_path()).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn e2e_shuffled_input_gives_same_scores() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let records = ledger(20);
    let mut reversed = records.clone();
    reversed.reverse();

    let a = run_pipeline(&records, &config).unwrap();
    let b = run_pipeline(&reversed, &config).unwrap();
    assert_eq!(a.features, b.features);
    assert_eq!(a.report.scores, b.report.scores);
}

// ---------------------------------------------------------------------------
// Schema failures
// ---------------------------------------------------------------------------

#[test]
fn e2e_missing_fields_abort_with_names() {
    let dir = tempfile::tempdir().unwrap();
    let mut records = ledger(3);
    let broken = records.len();
    records.push(serde_json::json!({
        "userWallet": "0xdead",
        "txHash": "0x1",
        "timestamp": T0,
        "action": "deposit",
        "actionData": {"amount": "1"},
    }));
    records.push(serde_json::json!({"userWallet": null}));
    let input = write_ledger(dir.path(), "ledger.json", &records);

    let err = run_file(&input, &fast_config(dir.path())).unwrap_err();
    match err {
        CreditError::Schema(SchemaError::MissingFields {
            index,
            fields,
            failed_records,
        }) => {
            assert_eq!(index, broken);
            assert_eq!(fields, vec!["assetSymbol", "assetPriceUSD"]);
            assert_eq!(failed_records, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("wallet_scores.csv").exists());
}

#[test]
fn e2e_non_array_input_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ledger.json");
    fs::write(&input, r#"{"records": []}"#).unwrap();
    let err = run_file(&input, &fast_config(dir.path())).unwrap_err();
    assert!(matches!(err, CreditError::Schema(SchemaError::NotAnArray)));
}

#[test]
fn e2e_non_object_record_rejected() {
    let config = fast_config(std::path::Path::new("."));
    let err = run_pipeline(&[serde_json::json!(42)], &config).unwrap_err();
    assert!(matches!(
        err,
        CreditError::Schema(SchemaError::NotAnObject { index: 0 })
    ));
}

// ---------------------------------------------------------------------------
// Feature scenarios
// ---------------------------------------------------------------------------

#[test]
fn deposit_then_repay_one_day_apart() {
    let records = vec![
        record("W", "deposit", T0, "100", "1"),
        record("W", "repay", T0 + DAY, "50", "1"),
    ];
    let out = run_pipeline(&records, &fast_config(std::path::Path::new("."))).unwrap();
    let f = &out.features[0];

    assert_eq!(f.total_txs, 2);
    assert_eq!(f.num_deposits, 1);
    assert_eq!(f.num_repays, 1);
    assert_eq!(f.total_deposit_usd, 100.0);
    assert_eq!(f.total_repay_usd, 50.0);
    assert_eq!(f.deposit_ratio, 0.5);
    assert_eq!(f.repay_ratio, 0.5);
    assert_eq!(f.time_span_days, 1);
    assert_eq!(f.avg_time_between_txs, 86_400.0);
    assert!(f.debt_to_deposit.abs() < 1e-12);
    assert_eq!(f.liquidation_ratio, 0.0);
}

#[test]
fn zero_deposit_debt_ratio_is_large_and_finite() {
    let rows = aggregate(&[tx("W", ActionKind::Borrow, Some(T0), 100.0, 1.0)]);
    assert_eq!(rows[0].debt_to_deposit, 100.0 / 1e-6);
    assert!(rows[0].debt_to_deposit.is_finite());
}

#[test]
fn single_transaction_wallet_has_no_time_stats() {
    let rows = aggregate(&[tx("W", ActionKind::Deposit, Some(T0), 5.0, 2.0)]);
    assert_eq!(rows[0].time_span_days, 0);
    assert_eq!(rows[0].avg_time_between_txs, 0.0);
}

#[test]
fn liquidation_lowers_target_all_else_equal() {
    // Ten actions each, no repayments; the tenth is a liquidation for one
    // wallet and an unscored action for the other.
    let mut txs = Vec::new();
    for (w, tenth) in [
        ("clean", ActionKind::Other("redeemunderlying".into())),
        ("liq", ActionKind::LiquidationCall),
    ] {
        for i in 0..10i64 {
            let action = match i {
                0..=5 => ActionKind::Deposit,
                6..=8 => ActionKind::Borrow,
                _ => tenth.clone(),
            };
            txs.push(tx(w, action, Some(T0 + i * DAY), 10.0, 1.0));
        }
    }

    let rows = aggregate(&txs);
    let clean = rows.iter().find(|r| r.wallet == "clean").unwrap();
    let liq = rows.iter().find(|r| r.wallet == "liq").unwrap();
    assert_eq!(liq.liquidation_ratio, 0.1);
    assert_eq!(clean.liquidation_ratio, 0.0);
    assert_eq!(clean.total_deposit_usd, liq.total_deposit_usd);

    let target = build_targets(&rows);
    let ci = rows.iter().position(|r| r.wallet == "clean").unwrap();
    let li = rows.iter().position(|r| r.wallet == "liq").unwrap();
    assert!(target.raw[li] < target.raw[ci]);
    assert!(target.values[li] < target.values[ci]);
}

// ---------------------------------------------------------------------------
// Degenerate populations
// ---------------------------------------------------------------------------

#[test]
fn single_wallet_scores_midpoint() {
    let records = vec![record("solo", "deposit", T0, "10", "1")];
    let out = run_pipeline(&records, &fast_config(std::path::Path::new("."))).unwrap();
    assert!(out.summary.degenerate_target);
    assert!(out.summary.cv.is_none());
    assert_eq!(out.report.scores.len(), 1);
    assert_eq!(out.report.scores[0].credit_score, 500.0);
}

#[test]
fn empty_ledger_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_ledger(dir.path(), "ledger.json", &[]);
    let config = fast_config(dir.path());
    let output = run_file(&input, &config).unwrap();
    write_reports(&output, &config.output).unwrap();
    assert_eq!(
        fs::read_to_string(config.output.scores_path()).unwrap(),
        "userWallet,credit_score\n"
    );
}
