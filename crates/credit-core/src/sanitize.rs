//! The sanitize contract.
//!
//! Every numeric fallback in the pipeline lives here, so degenerate values are
//! resolved in exactly two places: once after feature aggregation
//! ([`sanitize_features`]) and once after target construction
//! ([`sanitize_targets`]). Each rule is a small named function:
//!
//! | Rule               | Input            | Output                  |
//! |--------------------|------------------|-------------------------|
//! | [`finite_or_zero`] | NaN / ±inf       | `0.0`                   |
//! | [`safe_ratio`]     | zero denominator | `0.0`                   |
//! | [`clip_score`]     | any `f64`        | `[SCORE_MIN, SCORE_MAX]`|

use tracing::warn;

use crate::constants::{SCORE_MAX, SCORE_MIN};
use crate::types::WalletFeatureVector;

/// A sanitized value plus the number of entries that needed a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized<T> {
    pub value: T,
    pub replaced: usize,
}

/// Replace NaN and infinities with zero.
///
/// ```
/// use credit_core::sanitize::finite_or_zero;
/// assert_eq!(finite_or_zero(f64::NAN), 0.0);
/// assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
/// assert_eq!(finite_or_zero(-2.5), -2.5);
/// ```
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// `numerator / denominator`, or zero when the denominator is zero or the
/// quotient is not finite.
///
/// ```
/// use credit_core::sanitize::safe_ratio;
/// assert_eq!(safe_ratio(1.0, 4.0), 0.25);
/// assert_eq!(safe_ratio(3.0, 0.0), 0.0);
/// ```
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// Clamp a score to `[SCORE_MIN, SCORE_MAX]`. NaN maps to `SCORE_MIN`.
///
/// ```
/// use credit_core::sanitize::clip_score;
/// assert_eq!(clip_score(1200.0), 1000.0);
/// assert_eq!(clip_score(-3.0), 0.0);
/// assert_eq!(clip_score(f64::NAN), 0.0);
/// ```
pub fn clip_score(value: f64) -> f64 {
    if value.is_nan() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// Force every floating-point feature finite.
pub fn sanitize_features(rows: Vec<WalletFeatureVector>) -> Sanitized<Vec<WalletFeatureVector>> {
    let mut replaced = 0;
    let value: Vec<WalletFeatureVector> = rows
        .into_iter()
        .map(|mut row| {
            for field in row.float_fields_mut() {
                if !field.is_finite() {
                    *field = 0.0;
                    replaced += 1;
                }
            }
            row
        })
        .collect();

    if replaced > 0 {
        warn!(replaced, "degenerate aggregate: non-finite features replaced with 0");
    }
    Sanitized { value, replaced }
}

/// Force every target finite and within the score range.
pub fn sanitize_targets(values: Vec<f64>) -> Sanitized<Vec<f64>> {
    let mut replaced = 0;
    let value: Vec<f64> = values
        .into_iter()
        .map(|v| {
            if v.is_finite() {
                clip_score(v)
            } else {
                replaced += 1;
                0.0
            }
        })
        .collect();

    if replaced > 0 {
        warn!(replaced, "degenerate aggregate: non-finite targets replaced with 0");
    }
    Sanitized { value, replaced }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(repay_ratio: f64, debt_to_deposit: f64) -> WalletFeatureVector {
        WalletFeatureVector {
            wallet: "w".into(),
            total_txs: 1,
            num_deposits: 0,
            num_borrows: 0,
            num_repays: 0,
            num_liquidations: 0,
            total_deposit_usd: 0.0,
            total_borrow_usd: 0.0,
            total_repay_usd: 0.0,
            num_assets: 1,
            time_span_days: 0,
            avg_time_between_txs: 0.0,
            deposit_ratio: 0.0,
            borrow_ratio: 0.0,
            repay_ratio,
            liquidation_ratio: 0.0,
            debt_to_deposit,
        }
    }

    #[test]
    fn safe_ratio_non_finite_quotient_is_zero() {
        assert_eq!(safe_ratio(f64::MAX, f64::MIN_POSITIVE), 0.0);
        assert_eq!(safe_ratio(f64::NAN, 1.0), 0.0);
    }

    #[test]
    fn clip_score_keeps_in_range_values() {
        assert_eq!(clip_score(0.0), 0.0);
        assert_eq!(clip_score(1000.0), 1000.0);
        assert_eq!(clip_score(512.25), 512.25);
        assert_eq!(clip_score(f64::INFINITY), 1000.0);
        assert_eq!(clip_score(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn sanitize_features_replaces_nan_and_counts() {
        let rows = vec![row_with(f64::NAN, f64::INFINITY), row_with(0.5, 2.0)];
        let out = sanitize_features(rows);
        assert_eq!(out.replaced, 2);
        assert_eq!(out.value[0].repay_ratio, 0.0);
        assert_eq!(out.value[0].debt_to_deposit, 0.0);
        assert_eq!(out.value[1].repay_ratio, 0.5);
        assert!(out.value.iter().all(|r| r.is_finite()));
    }

    #[test]
    fn sanitize_features_clean_input_untouched() {
        let rows = vec![row_with(0.25, 1.0)];
        let out = sanitize_features(rows.clone());
        assert_eq!(out.replaced, 0);
        assert_eq!(out.value, rows);
    }

    #[test]
    fn sanitize_targets_zeroes_non_finite_and_clips() {
        let out = sanitize_targets(vec![f64::NAN, 1000.0000001, 250.0, f64::NEG_INFINITY]);
        assert_eq!(out.replaced, 2);
        assert_eq!(out.value, vec![0.0, 1000.0, 250.0, 0.0]);
    }
}
