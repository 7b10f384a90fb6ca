//! Playtime data loader
//!
//! Reads the tracker's JSON document (a flat map of source path →
//! record) and hands the aggregator an ordered record list. Document
//! order is preserved because the aggregator's tie-breaks are defined
//! over input encounter order.

use std::path::Path;

use crate::types::{RawRecord, Result, ShelfError};

/// Load the playtime file into (source key, record) pairs in document order.
///
/// A record that does not deserialize fails the whole load with an error
/// naming the offending source key; the file has a single trusted writer
/// and partial tolerance is not wanted.
pub fn load_records(path: &Path) -> Result<Vec<(String, RawRecord)>> {
    let mut bytes = std::fs::read(path)?;

    let raw: serde_json::Map<String, serde_json::Value> = simd_json::from_slice(&mut bytes)
        .map_err(|e| ShelfError::Parse(format!("{}: {}", path.display(), e)))?;

    let mut records = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let record: RawRecord = serde_json::from_value(value).map_err(|e| ShelfError::Record {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        records.push((key, record));
    }

    Ok(records)
}
