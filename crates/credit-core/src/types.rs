//! Ledger, feature and score types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::FEATURE_COUNT;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Category of a lending-protocol event.
///
/// Parsing ignores case and `-`/`_` separators. Unknown actions keep their
/// original spelling in [`ActionKind::Other`].
///
/// ```
/// use credit_core::types::ActionKind;
/// assert_eq!(ActionKind::parse("liquidationcall"), ActionKind::LiquidationCall);
/// assert_eq!(ActionKind::parse("Liquidation-Call"), ActionKind::LiquidationCall);
/// assert_eq!(ActionKind::parse("DEPOSIT"), ActionKind::Deposit);
/// assert_eq!(ActionKind::parse("redeemunderlying"), ActionKind::Other("redeemunderlying".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    Deposit,
    Borrow,
    Repay,
    LiquidationCall,
    Other(String),
}

impl ActionKind {
    pub fn parse(raw: &str) -> Self {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "deposit" => Self::Deposit,
            "borrow" => Self::Borrow,
            "repay" => Self::Repay,
            "liquidationcall" => Self::LiquidationCall,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Deposit => "deposit",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::LiquidationCall => "liquidationcall",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// One validated ledger event. Numeric and temporal fields are kept as raw
/// JSON so coercion happens in exactly one place.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub user_wallet: String,
    pub action: ActionKind,
    /// Carried through for traceability; not used by any aggregate.
    pub tx_hash: String,
    pub timestamp: Value,
    pub asset_symbol: String,
    /// `None` when the record has no `amount` at all.
    pub amount: Option<Value>,
    pub asset_price_usd: Value,
}

/// A [`RawTransaction`] with coerced numerics and a parsed instant.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTransaction {
    pub user_wallet: String,
    pub action: ActionKind,
    pub tx_hash: String,
    /// `None` when the raw timestamp could not be parsed.
    pub timestamp: Option<DateTime<Utc>>,
    pub asset_symbol: String,
    pub amount: f64,
    pub asset_price_usd: f64,
    /// `amount * asset_price_usd`, forced finite.
    pub usd_value: f64,
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Column names of the feature matrix, in [`WalletFeatureVector::to_array`] order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "total_txs",
    "num_deposits",
    "num_borrows",
    "num_repays",
    "num_liquidations",
    "total_deposit_usd",
    "total_borrow_usd",
    "total_repay_usd",
    "num_assets",
    "time_span_days",
    "avg_time_between_txs",
    "deposit_ratio",
    "borrow_ratio",
    "repay_ratio",
    "liquidation_ratio",
    "debt_to_deposit",
];

/// Behavioural summary of one wallet.
///
/// # Invariants
///
/// * `total_txs >= 1`
/// * every `f64` field is finite
/// * `num_deposits + num_borrows + num_repays + num_liquidations <= total_txs`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletFeatureVector {
    #[serde(rename = "userWallet")]
    pub wallet: String,
    pub total_txs: u64,
    pub num_deposits: u64,
    pub num_borrows: u64,
    pub num_repays: u64,
    pub num_liquidations: u64,
    pub total_deposit_usd: f64,
    pub total_borrow_usd: f64,
    pub total_repay_usd: f64,
    pub num_assets: u64,
    pub time_span_days: u64,
    /// Mean inter-transaction gap in seconds.
    pub avg_time_between_txs: f64,
    pub deposit_ratio: f64,
    pub borrow_ratio: f64,
    pub repay_ratio: f64,
    pub liquidation_ratio: f64,
    pub debt_to_deposit: f64,
}

impl WalletFeatureVector {
    /// Numeric features in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.total_txs as f64,
            self.num_deposits as f64,
            self.num_borrows as f64,
            self.num_repays as f64,
            self.num_liquidations as f64,
            self.total_deposit_usd,
            self.total_borrow_usd,
            self.total_repay_usd,
            self.num_assets as f64,
            self.time_span_days as f64,
            self.avg_time_between_txs,
            self.deposit_ratio,
            self.borrow_ratio,
            self.repay_ratio,
            self.liquidation_ratio,
            self.debt_to_deposit,
        ]
    }

    /// Mutable access to every floating-point field.
    pub fn float_fields_mut(&mut self) -> [&mut f64; 9] {
        [
            &mut self.total_deposit_usd,
            &mut self.total_borrow_usd,
            &mut self.total_repay_usd,
            &mut self.avg_time_between_txs,
            &mut self.deposit_ratio,
            &mut self.borrow_ratio,
            &mut self.repay_ratio,
            &mut self.liquidation_ratio,
            &mut self.debt_to_deposit,
        ]
    }

    /// Whether every numeric feature is finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Row-major feature matrix for a wallet population.
pub fn feature_matrix(rows: &[WalletFeatureVector]) -> Vec<Vec<f64>> {
    rows.iter().map(|r| r.to_array().to_vec()).collect()
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Final pipeline output for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredWallet {
    #[serde(rename = "userWallet")]
    pub wallet: String,
    /// Clipped to `[SCORE_MIN, SCORE_MAX]`.
    pub credit_score: f64,
}
