//! Pipeline constants. Scores are dimensionless floats in `[SCORE_MIN, SCORE_MAX]`.

// ---------------------------------------------------------------------------
// Input schema
// ---------------------------------------------------------------------------

pub const FIELD_USER_WALLET: &str = "userWallet";
pub const FIELD_ACTION: &str = "action";
pub const FIELD_TX_HASH: &str = "txHash";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_ASSET_SYMBOL: &str = "assetSymbol";
pub const FIELD_ASSET_PRICE_USD: &str = "assetPriceUSD";
pub const FIELD_AMOUNT: &str = "amount";

/// Sub-object holding action-specific attributes; lifted to the top level
/// before validation.
pub const ACTION_DATA_KEY: &str = "actionData";

/// Separator used when flattening nested objects inside [`ACTION_DATA_KEY`].
pub const FLATTEN_SEPARATOR: char = '.';

/// Fields every record must carry after flattening.
pub const REQUIRED_FIELDS: [&str; 6] = [
    FIELD_USER_WALLET,
    FIELD_ACTION,
    FIELD_TX_HASH,
    FIELD_TIMESTAMP,
    FIELD_ASSET_SYMBOL,
    FIELD_ASSET_PRICE_USD,
];

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Number of numeric features per wallet.
pub const FEATURE_COUNT: usize = 16;

/// Added to the deposit total in `debt_to_deposit` so wallets with no
/// deposits still get a finite ratio.
pub const DEPOSIT_EPSILON: f64 = 1e-6;

pub const SECONDS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Synthetic target
// ---------------------------------------------------------------------------

pub const WEIGHT_REPAY_RATIO: f64 = 0.35;
pub const WEIGHT_DEPOSIT_RATIO: f64 = 0.20;
pub const WEIGHT_LOG_DEPOSIT_USD: f64 = 0.10;
pub const WEIGHT_LOG_TIME_SPAN: f64 = 0.05;
pub const WEIGHT_DEBT_TO_DEPOSIT: f64 = -0.10;
pub const WEIGHT_LIQUIDATION_RATIO: f64 = -0.20;

/// Target emitted for every wallet when the raw targets have no spread.
pub const DEGENERATE_TARGET: f64 = 500.0;

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 1000.0;

/// Width of one histogram bucket in score points.
pub const HISTOGRAM_BUCKET_WIDTH: f64 = 100.0;

/// Number of histogram buckets covering `[SCORE_MIN, SCORE_MAX]`.
///
/// ```
/// use credit_core::constants::{HISTOGRAM_BUCKETS, HISTOGRAM_BUCKET_WIDTH, SCORE_MAX};
/// assert_eq!(HISTOGRAM_BUCKETS as f64 * HISTOGRAM_BUCKET_WIDTH, SCORE_MAX);
/// ```
pub const HISTOGRAM_BUCKETS: usize = 10;

// ---------------------------------------------------------------------------
// Model defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_N_ESTIMATORS: usize = 100;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_CV_FOLDS: usize = 5;
pub const DEFAULT_MIN_SAMPLES_SPLIT: usize = 2;
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 1;
