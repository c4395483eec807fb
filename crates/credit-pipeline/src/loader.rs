//! Reading the input ledger.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use tracing::info;

use credit_core::error::{CreditResult, SchemaError};

/// Parse a JSON document that must be an array of records.
pub fn records_from_reader<R: Read>(reader: R) -> CreditResult<Vec<Value>> {
    let doc: Value = serde_json::from_reader(reader)?;
    match doc {
        Value::Array(records) => Ok(records),
        _ => Err(SchemaError::NotAnArray.into()),
    }
}

/// Same as [`records_from_reader`] for an in-memory document.
pub fn records_from_str(json: &str) -> CreditResult<Vec<Value>> {
    records_from_reader(json.as_bytes())
}

/// Load the record array from a JSON file.
pub fn load_records(path: &Path) -> CreditResult<Vec<Value>> {
    let file = File::open(path)?;
    let records = records_from_reader(BufReader::new(file))?;
    info!(path = %path.display(), records = records.len(), "loader: records read");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_core::error::CreditError;

    #[test]
    fn reads_array_of_records() {
        let records = records_from_str(r#"[{"a": 1}, {"b": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(records_from_str("[]").unwrap().is_empty());
    }

    #[test]
    fn top_level_object_is_schema_error() {
        let err = records_from_str(r#"{"userWallet": "0xabc"}"#).unwrap_err();
        assert!(matches!(err, CreditError::Schema(SchemaError::NotAnArray)));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = records_from_str("[{").unwrap_err();
        assert!(matches!(err, CreditError::Json(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CreditError::Io(_)));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"[{"userWallet": "0x1"}]"#).unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 1);
    }
}
