//! Boundary row loading: turn CSV/JSON text into untyped [`RawRow`]s for the
//! normalizer. A malformed batch is rejected whole, never partially applied.

use serde_json::Value;

use crate::error::TriageError;
use crate::model::RawRow;

/// Load headered CSV text into raw rows. Every cell enters as a string;
/// typing happens in the normalizer. Rows with no content are skipped.
pub fn parse_csv_rows(csv_data: &str) -> Result<Vec<RawRow>, TriageError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TriageError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TriageError::Csv(e.to_string()))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(cell) = record.get(i) {
                row.insert(header.clone(), Value::String(cell.to_string()));
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Load a JSON import payload. The payload must be an array of objects;
/// anything else rejects the whole batch.
pub fn parse_json_rows(input: &str) -> Result<Vec<RawRow>, TriageError> {
    let value: Value =
        serde_json::from_str(input).map_err(|e| TriageError::InvalidRows(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(TriageError::InvalidRows("expected an array of rows".into()));
    };

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => rows.push(map),
            _ => {
                return Err(TriageError::InvalidRows(format!(
                    "row {i} is not an object"
                )))
            }
        }
    }
    Ok(rows)
}
