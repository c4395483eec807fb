//! Feature aggregator.
//!
//! Transactions are partitioned by wallet into a `BTreeMap`, so rows come out
//! sorted by wallet id. Within a partition the rows are put into a canonical
//! order before reduction; floating-point sums are therefore bitwise equal no
//! matter how the input was ordered.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use tracing::{debug, info};

use credit_core::constants::DEPOSIT_EPSILON;
use credit_core::sanitize::{safe_ratio, sanitize_features, Sanitized};
use credit_core::types::{ActionKind, NormalizedTransaction, WalletFeatureVector};

/// Aggregate transactions into one sanitized feature row per wallet.
pub fn aggregate(transactions: &[NormalizedTransaction]) -> Vec<WalletFeatureVector> {
    aggregate_sanitized(transactions).value
}

/// Like [`aggregate`], also reporting how many fields the sanitize step had
/// to replace.
pub fn aggregate_sanitized(
    transactions: &[NormalizedTransaction],
) -> Sanitized<Vec<WalletFeatureVector>> {
    let mut partitions: BTreeMap<&str, Vec<&NormalizedTransaction>> = BTreeMap::new();
    for tx in transactions {
        partitions.entry(tx.user_wallet.as_str()).or_default().push(tx);
    }

    let rows: Vec<WalletFeatureVector> = partitions
        .into_iter()
        .map(|(wallet, mut txs)| {
            txs.sort_by(|a, b| canonical_order(a, b));
            let row = reduce_wallet(wallet, &txs);
            debug!(wallet, total_txs = row.total_txs, "aggregate: wallet reduced");
            row
        })
        .collect();

    info!(
        transactions = transactions.len(),
        wallets = rows.len(),
        "aggregate: feature table built"
    );

    sanitize_features(rows)
}

type SortKey<'a> = (
    Option<DateTime<Utc>>,
    &'a str,
    &'a ActionKind,
    &'a str,
    OrderedFloat<f64>,
    OrderedFloat<f64>,
);

fn sort_key(tx: &NormalizedTransaction) -> SortKey<'_> {
    (
        tx.timestamp,
        tx.tx_hash.as_str(),
        &tx.action,
        tx.asset_symbol.as_str(),
        OrderedFloat(tx.amount),
        OrderedFloat(tx.asset_price_usd),
    )
}

/// Total order over a wallet's transactions. Untimed rows sort first.
fn canonical_order(a: &NormalizedTransaction, b: &NormalizedTransaction) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Running per-wallet statistics. Every field is a commutative reduction
/// (count, sum, set union, min, max).
#[derive(Debug, Default)]
struct WalletAccumulator<'a> {
    total_txs: u64,
    num_deposits: u64,
    num_borrows: u64,
    num_repays: u64,
    num_liquidations: u64,
    total_deposit_usd: f64,
    total_borrow_usd: f64,
    total_repay_usd: f64,
    assets: BTreeSet<&'a str>,
    timed_txs: u64,
    first_seen: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
}

impl<'a> WalletAccumulator<'a> {
    fn push(&mut self, tx: &'a NormalizedTransaction) {
        self.total_txs += 1;
        self.assets.insert(tx.asset_symbol.as_str());

        match tx.action {
            ActionKind::Deposit => {
                self.num_deposits += 1;
                self.total_deposit_usd += tx.usd_value;
            }
            ActionKind::Borrow => {
                self.num_borrows += 1;
                self.total_borrow_usd += tx.usd_value;
            }
            ActionKind::Repay => {
                self.num_repays += 1;
                self.total_repay_usd += tx.usd_value;
            }
            ActionKind::LiquidationCall => {
                self.num_liquidations += 1;
            }
            ActionKind::Other(_) => {}
        }

        // Untimed rows still count above, but not toward the time statistics.
        if let Some(ts) = tx.timestamp {
            self.timed_txs += 1;
            self.first_seen = Some(self.first_seen.map_or(ts, |f| f.min(ts)));
            self.last_seen = Some(self.last_seen.map_or(ts, |l| l.max(ts)));
        }
    }

    fn finish(self, wallet: &str) -> WalletFeatureVector {
        let total = self.total_txs as f64;

        let (time_span_days, span_secs) = match (self.first_seen, self.last_seen) {
            (Some(first), Some(last)) if self.timed_txs >= 2 => {
                let delta = last - first;
                let days = delta.num_days().max(0) as u64;
                let secs = delta.num_milliseconds().max(0) as f64 / 1000.0;
                (days, secs)
            }
            _ => (0, 0.0),
        };
        let gaps = self.timed_txs.saturating_sub(1).max(1) as f64;

        WalletFeatureVector {
            wallet: wallet.to_string(),
            total_txs: self.total_txs,
            num_deposits: self.num_deposits,
            num_borrows: self.num_borrows,
            num_repays: self.num_repays,
            num_liquidations: self.num_liquidations,
            total_deposit_usd: self.total_deposit_usd,
            total_borrow_usd: self.total_borrow_usd,
            total_repay_usd: self.total_repay_usd,
            num_assets: self.assets.len() as u64,
            time_span_days,
            avg_time_between_txs: span_secs / gaps,
            deposit_ratio: safe_ratio(self.num_deposits as f64, total),
            borrow_ratio: safe_ratio(self.num_borrows as f64, total),
            repay_ratio: safe_ratio(self.num_repays as f64, total),
            liquidation_ratio: safe_ratio(self.num_liquidations as f64, total),
            debt_to_deposit: safe_ratio(
                self.total_borrow_usd,
                self.total_deposit_usd + DEPOSIT_EPSILON,
            ),
        }
    }
}

/// Reduce one wallet's transactions, in the given order, to a feature row.
fn reduce_wallet(wallet: &str, txs: &[&NormalizedTransaction]) -> WalletFeatureVector {
    let mut acc = WalletAccumulator::default();
    for &tx in txs {
        acc.push(tx);
    }
    acc.finish(wallet)
}
