//! Transaction normalizer.
//!
//! Pure transform from semi-structured JSON records to
//! [`NormalizedTransaction`]s, in three steps:
//!
//! 1. [`flatten_record`] lifts the `actionData` sub-object to the top level.
//! 2. [`validate_record`] checks the required field set; a missing field is a
//!    fatal [`SchemaError`].
//! 3. [`normalize`] coerces timestamps and numerics. Coercion failures are
//!    recovered locally (zero or `None`) and counted, never raised.
//!
//! Rows whose timestamp cannot be parsed are kept: they count toward action
//! and USD aggregates but are skipped by time-based aggregates.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::{
    ACTION_DATA_KEY, FIELD_ACTION, FIELD_AMOUNT, FIELD_ASSET_PRICE_USD, FIELD_ASSET_SYMBOL,
    FIELD_TIMESTAMP, FIELD_TX_HASH, FIELD_USER_WALLET, FLATTEN_SEPARATOR, REQUIRED_FIELDS,
};
use crate::error::SchemaError;
use crate::sanitize::finite_or_zero;
use crate::types::{ActionKind, NormalizedTransaction, RawTransaction};

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// Lift the entries of `actionData` onto the record's top level.
///
/// Nested objects inside `actionData` are flattened with `.`-joined keys.
/// When a lifted key already exists at the top level, the top-level value is
/// kept. A `null` `actionData` is dropped; a non-object one is left alone.
pub fn flatten_record(index: usize, record: &Value) -> Result<Map<String, Value>, SchemaError> {
    let Value::Object(map) = record else {
        return Err(SchemaError::NotAnObject { index });
    };
    let mut flat = map.clone();

    match flat.remove(ACTION_DATA_KEY) {
        Some(Value::Object(nested)) => {
            let mut lifted = Map::new();
            flatten_into(&mut lifted, None, nested);
            for (key, value) in lifted {
                if flat.contains_key(&key) {
                    debug!(index, key = %key, "flatten: top-level field shadows actionData field");
                    continue;
                }
                flat.insert(key, value);
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => {
            flat.insert(ACTION_DATA_KEY.to_string(), other);
        }
    }

    Ok(flat)
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, map: Map<String, Value>) {
    for (key, value) in map {
        let full_key = match prefix {
            Some(p) => format!("{p}{FLATTEN_SEPARATOR}{key}"),
            None => key,
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                flatten_into(out, Some(&full_key), inner);
            }
            other => {
                out.insert(full_key, other);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Fields from [`REQUIRED_FIELDS`] that are absent, `null`, or not a scalar.
pub fn missing_fields(record: &Map<String, Value>) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| match record.get(**field) {
            None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => true,
            Some(_) => false,
        })
        .map(|field| field.to_string())
        .collect()
}

/// Build a [`RawTransaction`] from a flattened record.
pub fn validate_record(
    index: usize,
    record: &Map<String, Value>,
) -> Result<RawTransaction, SchemaError> {
    let missing = missing_fields(record);
    if !missing.is_empty() {
        return Err(SchemaError::MissingFields {
            index,
            fields: missing,
            failed_records: 1,
        });
    }

    // Presence of every required field was checked above.
    let text = |field: &str| record.get(field).map(scalar_to_string).unwrap_or_default();
    let value = |field: &str| record.get(field).cloned().unwrap_or(Value::Null);

    Ok(RawTransaction {
        user_wallet: text(FIELD_USER_WALLET),
        action: ActionKind::parse(&text(FIELD_ACTION)),
        tx_hash: text(FIELD_TX_HASH),
        timestamp: value(FIELD_TIMESTAMP),
        asset_symbol: text(FIELD_ASSET_SYMBOL),
        amount: record.get(FIELD_AMOUNT).cloned(),
        asset_price_usd: value(FIELD_ASSET_PRICE_USD),
    })
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten and validate a batch of JSON records.
///
/// Fails on the first invalid record; the error reports how many records in
/// the whole batch failed so a single run surfaces the size of the problem.
pub fn parse_records(records: &[Value]) -> Result<Vec<RawTransaction>, SchemaError> {
    let mut parsed = Vec::with_capacity(records.len());
    let mut first_error: Option<SchemaError> = None;
    let mut failed = 0usize;

    for (index, record) in records.iter().enumerate() {
        let result = flatten_record(index, record).and_then(|flat| validate_record(index, &flat));
        match result {
            Ok(tx) => {
                if first_error.is_none() {
                    parsed.push(tx);
                }
            }
            Err(e) => {
                failed += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        None => Ok(parsed),
        Some(SchemaError::MissingFields { index, fields, .. }) => {
            Err(SchemaError::MissingFields {
                index,
                fields,
                failed_records: failed,
            })
        }
        Some(other) => Err(other),
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Interpret a JSON value as Unix seconds.
///
/// Accepts integers, floats (fractional seconds kept) and numeric strings.
/// Anything else, or an instant outside chrono's range, is `None`.
///
/// ```
/// use credit_core::normalize::coerce_timestamp;
/// use serde_json::json;
/// assert_eq!(coerce_timestamp(&json!(0)).unwrap().timestamp(), 0);
/// assert_eq!(coerce_timestamp(&json!("1629178166")).unwrap().timestamp(), 1_629_178_166);
/// assert!(coerce_timestamp(&json!("yesterday")).is_none());
/// ```
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                n.as_f64().and_then(timestamp_from_f64)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(secs) = trimmed.parse::<i64>() {
                DateTime::from_timestamp(secs, 0)
            } else {
                trimmed.parse::<f64>().ok().and_then(timestamp_from_f64)
            }
        }
        _ => None,
    }
}

fn timestamp_from_f64(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs.abs() >= i64::MAX as f64 {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Interpret a JSON value as a finite `f64`.
///
/// ```
/// use credit_core::normalize::coerce_f64;
/// use serde_json::json;
/// assert_eq!(coerce_f64(&json!(1.5)), Some(1.5));
/// assert_eq!(coerce_f64(&json!(" 2000000000000000000 ")), Some(2e18));
/// assert_eq!(coerce_f64(&json!("n/a")), None);
/// assert_eq!(coerce_f64(&json!(null)), None);
/// ```
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalized batch plus counts of recovered coercions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    pub transactions: Vec<NormalizedTransaction>,
    pub bad_timestamps: usize,
    pub bad_amounts: usize,
    pub bad_prices: usize,
}

impl NormalizeOutcome {
    pub fn coercions(&self) -> usize {
        self.bad_timestamps + self.bad_amounts + self.bad_prices
    }
}

/// Normalize one transaction. Never fails.
pub fn normalize(raw: &RawTransaction) -> NormalizedTransaction {
    let amount = raw.amount.as_ref().and_then(coerce_f64).unwrap_or(0.0);
    let asset_price_usd = coerce_f64(&raw.asset_price_usd).unwrap_or(0.0);

    NormalizedTransaction {
        user_wallet: raw.user_wallet.clone(),
        action: raw.action.clone(),
        tx_hash: raw.tx_hash.clone(),
        timestamp: coerce_timestamp(&raw.timestamp),
        asset_symbol: raw.asset_symbol.clone(),
        amount,
        asset_price_usd,
        usd_value: finite_or_zero(amount * asset_price_usd),
    }
}

/// Normalize a batch, counting every value that had to be coerced.
pub fn normalize_all(raws: &[RawTransaction]) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome {
        transactions: Vec::with_capacity(raws.len()),
        ..NormalizeOutcome::default()
    };

    for raw in raws {
        let tx = normalize(raw);
        if tx.timestamp.is_none() {
            outcome.bad_timestamps += 1;
        }
        if raw.amount.as_ref().and_then(coerce_f64).is_none() {
            outcome.bad_amounts += 1;
        }
        if coerce_f64(&raw.asset_price_usd).is_none() {
            outcome.bad_prices += 1;
        }
        outcome.transactions.push(tx);
    }

    if outcome.coercions() > 0 {
        warn!(
            bad_timestamps = outcome.bad_timestamps,
            bad_amounts = outcome.bad_amounts,
            bad_prices = outcome.bad_prices,
            "normalize: recovered type coercions"
        );
    }

    outcome
}
