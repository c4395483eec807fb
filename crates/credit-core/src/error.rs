//! Error types for the credit scoring pipeline.
use thiserror::Error;

/// Structural problems with the input ledger. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("input is not a JSON array of records")] NotAnArray,
    #[error("record {index} is not a JSON object")] NotAnObject { index: usize },
    #[error("record {index} missing required field(s): {} ({failed_records} record(s) failed validation)", .fields.join(", "))]
    MissingFields { index: usize, fields: Vec<String>, failed_records: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("empty training set")] EmptyTrainingSet,
    #[error("shape mismatch: {rows} feature rows, {targets} targets")] ShapeMismatch { rows: usize, targets: usize },
    #[error("ragged feature matrix: row {row} has {got} columns, expected {expected}")] RaggedRow { row: usize, got: usize, expected: usize },
    #[error("model not fitted")] NotFitted,
    #[error("invalid model config: {0}")] InvalidConfig(String),
}

#[derive(Error, Debug)]
pub enum CreditError {
    #[error(transparent)] Schema(#[from] SchemaError),
    #[error(transparent)] Model(#[from] ModelError),
    #[error("io: {0}")] Io(#[from] std::io::Error),
    #[error("json: {0}")] Json(#[from] serde_json::Error),
    #[error("csv: {0}")] Csv(String),
    #[error("config: {0}")] Config(String),
}

pub type CreditResult<T> = Result<T, CreditError>;
