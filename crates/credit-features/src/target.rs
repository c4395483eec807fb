//! Synthetic target builder.
//!
//! No ground-truth labels exist, so the regression target is a hand-weighted
//! formula over the features:
//!
//! ```text
//! raw = 0.35·repay_ratio + 0.20·deposit_ratio
//!     + 0.10·ln(1 + total_deposit_usd) + 0.05·ln(1 + time_span_days)
//!     − 0.10·debt_to_deposit − 0.20·liquidation_ratio
//! ```
//!
//! min-max rescaled to `[0, 1000]` over the wallets of the current run. The
//! result is relative: a different wallet population changes every target.

use tracing::{info, warn};

use credit_core::constants::{
    DEGENERATE_TARGET, SCORE_MAX, WEIGHT_DEBT_TO_DEPOSIT, WEIGHT_DEPOSIT_RATIO,
    WEIGHT_LIQUIDATION_RATIO, WEIGHT_LOG_DEPOSIT_USD, WEIGHT_LOG_TIME_SPAN, WEIGHT_REPAY_RATIO,
};
use credit_core::sanitize::sanitize_targets;
use credit_core::types::WalletFeatureVector;

/// Per-wallet targets, aligned with the feature rows they were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticTarget {
    /// Unscaled formula output.
    pub raw: Vec<f64>,
    /// Rescaled targets in `[0, 1000]`.
    pub values: Vec<f64>,
    /// `true` when every raw value was identical and [`DEGENERATE_TARGET`]
    /// was emitted for all wallets.
    pub degenerate: bool,
}

/// Unscaled target for one wallet.
pub fn raw_target(row: &WalletFeatureVector) -> f64 {
    WEIGHT_REPAY_RATIO * row.repay_ratio
        + WEIGHT_DEPOSIT_RATIO * row.deposit_ratio
        + WEIGHT_LOG_DEPOSIT_USD * row.total_deposit_usd.ln_1p()
        + WEIGHT_LOG_TIME_SPAN * (row.time_span_days as f64).ln_1p()
        + WEIGHT_DEBT_TO_DEPOSIT * row.debt_to_deposit
        + WEIGHT_LIQUIDATION_RATIO * row.liquidation_ratio
}

/// Build and rescale targets for the whole population.
pub fn build_targets(rows: &[WalletFeatureVector]) -> SyntheticTarget {
    let raw: Vec<f64> = rows.iter().map(raw_target).collect();

    let (min, max) = raw
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let spread = max - min;

    let degenerate = !rows.is_empty() && !(spread.is_finite() && spread > 0.0);
    let scaled: Vec<f64> = if degenerate {
        warn!(
            wallets = rows.len(),
            target = DEGENERATE_TARGET,
            "degenerate aggregate: raw targets have no spread"
        );
        vec![DEGENERATE_TARGET; raw.len()]
    } else {
        raw.iter().map(|v| (v - min) / spread * SCORE_MAX).collect()
    };

    let values = sanitize_targets(scaled).value;
    info!(wallets = values.len(), degenerate, "target: synthetic targets built");

    SyntheticTarget {
        raw,
        values,
        degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(wallet: &str) -> WalletFeatureVector {
        WalletFeatureVector {
            wallet: wallet.into(),
            total_txs: 10,
            num_deposits: 5,
            num_borrows: 2,
            num_repays: 0,
            num_liquidations: 0,
            total_deposit_usd: 5_000.0,
            total_borrow_usd: 1_000.0,
            total_repay_usd: 0.0,
            num_assets: 2,
            time_span_days: 30,
            avg_time_between_txs: 288_000.0,
            deposit_ratio: 0.5,
            borrow_ratio: 0.2,
            repay_ratio: 0.0,
            liquidation_ratio: 0.0,
            debt_to_deposit: 0.2,
        }
    }

    #[test]
    fn raw_target_matches_formula() {
        let r = row("w");
        let expected = 0.35 * 0.0 + 0.20 * 0.5 + 0.10 * (5_001.0f64).ln()
            + 0.05 * (31.0f64).ln()
            - 0.10 * 0.2
            - 0.20 * 0.0;
        assert!((raw_target(&r) - expected).abs() < 1e-12);
    }

    #[test]
    fn liquidation_lowers_target() {
        let clean = row("clean");
        let mut liquidated = row("liquidated");
        liquidated.num_liquidations = 1;
        liquidated.liquidation_ratio = 0.1;

        assert!(raw_target(&liquidated) < raw_target(&clean));

        let t = build_targets(&[clean, liquidated]);
        assert!(t.values[1] < t.values[0]);
        assert_eq!(t.values[0], 1000.0);
        assert_eq!(t.values[1], 0.0);
    }

    #[test]
    fn targets_span_full_range() {
        let mut a = row("a");
        a.repay_ratio = 0.4;
        let b = row("b");
        let mut c = row("c");
        c.debt_to_deposit = 3.0;
        let t = build_targets(&[a, b, c]);
        assert!(!t.degenerate);
        assert_eq!(t.values[0], 1000.0);
        assert_eq!(t.values[2], 0.0);
        assert!(t.values[1] > 0.0 && t.values[1] < 1000.0);
    }

    #[test]
    fn identical_wallets_get_constant_midpoint() {
        let t = build_targets(&[row("a"), row("b"), row("c")]);
        assert!(t.degenerate);
        assert_eq!(t.values, vec![DEGENERATE_TARGET; 3]);
    }

    #[test]
    fn single_wallet_is_degenerate() {
        let t = build_targets(&[row("only")]);
        assert!(t.degenerate);
        assert_eq!(t.values, vec![500.0]);
    }

    #[test]
    fn empty_population_yields_empty_target() {
        let t = build_targets(&[]);
        assert!(t.values.is_empty());
        assert!(!t.degenerate);
    }

    #[test]
    fn non_finite_raw_target_is_sanitized() {
        let mut bad = row("bad");
        // ln_1p of a value below -1 is NaN.
        bad.total_deposit_usd = -5.0;
        let mut good = row("good");
        good.repay_ratio = 0.9;
        let t = build_targets(&[bad, good, row("plain")]);
        assert!(t.raw[0].is_nan());
        assert!(t.values.iter().all(|v| v.is_finite()));
        assert_eq!(t.values[0], 0.0);
    }

    #[test]
    fn build_is_deterministic() {
        let rows = vec![row("a"), {
            let mut r = row("b");
            r.repay_ratio = 0.3;
            r
        }];
        assert_eq!(build_targets(&rows), build_targets(&rows));
    }
}
