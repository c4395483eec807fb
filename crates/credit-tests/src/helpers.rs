//! Shared builders for integration and property tests.

use std::path::{Path, PathBuf};

use chrono::DateTime;
use serde_json::{json, Value};

use credit_core::types::{ActionKind, NormalizedTransaction};
use credit_pipeline::PipelineConfig;

/// Base timestamp for generated ledgers (2021-08-17 UTC).
pub const T0: i64 = 1_629_178_166;

pub const DAY: i64 = 86_400;

/// Deterministic wallet address from an index.
pub fn wallet(i: usize) -> String {
    format!("0x{i:040x}")
}

/// One raw record in the lending-protocol export shape, with the amount and
/// asset fields nested under `actionData`.
pub fn record(wallet: &str, action: &str, ts: i64, amount: &str, price: &str) -> Value {
    json!({
        "_id": {"$oid": format!("{ts:x}")},
        "userWallet": wallet,
        "network": "polygon",
        "protocol": "aave_v2",
        "txHash": format!("0x{wallet}{ts:x}{action}"),
        "logId": format!("0x{ts:x}_0"),
        "timestamp": ts,
        "blockNumber": 1_629_178_166u64,
        "action": action,
        "actionData": {
            "type": action,
            "amount": amount,
            "assetSymbol": "USDC",
            "assetPriceUSD": price,
            "poolId": "0x2791bca1f2de4661ed88a30c99a7a9449aa84174",
            "userId": wallet,
        },
    })
}

/// A varied, deterministic ledger of `wallets` wallets.
///
/// Wallet `i` gets `1 + i % 5` actions spread one day apart, cycling through
/// deposit, borrow, repay and (for every seventh wallet) a liquidation.
pub fn ledger(wallets: usize) -> Vec<Value> {
    let mut out = Vec::new();
    for i in 0..wallets {
        let w = wallet(i);
        for j in 0..=(i % 5) {
            let action = match (i + j) % 4 {
                0 | 3 => "deposit",
                1 => "borrow",
                _ => "repay",
            };
            let amount = format!("{}", 1_000_000 * (i + 1) * (j + 2));
            let price = format!("{:.4}", 0.9 + (i % 3) as f64 * 0.05);
            out.push(record(&w, action, T0 + (i as i64) * 600 + (j as i64) * DAY, &amount, &price));
        }
        if i % 7 == 6 {
            out.push(record(&w, "liquidationcall", T0 + 30 * DAY, "500", "1.0"));
        }
    }
    out
}

/// A normalized transaction with explicit fields, for stage-level tests.
pub fn tx(
    wallet: &str,
    action: ActionKind,
    ts: Option<i64>,
    amount: f64,
    price: f64,
) -> NormalizedTransaction {
    NormalizedTransaction {
        user_wallet: wallet.to_string(),
        action,
        tx_hash: format!("0x{}", ts.unwrap_or(0)),
        timestamp: ts.and_then(|s| DateTime::from_timestamp(s, 0)),
        asset_symbol: "USDC".to_string(),
        amount,
        asset_price_usd: price,
        usd_value: amount * price,
    }
}

/// Default config with a small forest, so tests stay fast.
pub fn fast_config(out_dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.model.n_estimators = 12;
    config.output.dir = out_dir.to_path_buf();
    config
}

/// Write `records` as a JSON array to `dir/name`.
pub fn write_ledger(dir: &Path, name: &str, records: &[Value]) -> PathBuf {
    let path = dir.join(name);
    let body = serde_json::to_string_pretty(records).expect("serialize ledger");
    std::fs::write(&path, body).expect("write ledger");
    path
}
