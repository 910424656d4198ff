use serde_json::Value;

use crate::model::{RawRow, Record, TAG_INBOX};
use crate::schema::{FieldSchema, DEFAULT_ID_FIELDS, TAG_FIELD};

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------
// All coercions are total: malformed input collapses to the absence value,
// never to an error and never to zero.

pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Tri-state flag: `None` is "unknown", a genuine third state distinct from
/// `false`.
pub fn to_flag(value: &Value) -> Option<bool> {
    let text = match value {
        Value::Bool(b) => return Some(*b),
        Value::Null => return None,
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };
    match text.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Row normalization
// ---------------------------------------------------------------------------

/// Coerce a raw row into a canonical [`Record`] per the schema, deriving the
/// identity. Total: malformed fields become absences.
pub fn normalize_row(raw: &RawRow, schema: &FieldSchema) -> Record {
    let mut record = Record::default();

    for field in &schema.strings {
        if schema.lower_tags && field == TAG_FIELD {
            continue; // reserved; handled below
        }
        let text = raw.get(field).map(to_text).unwrap_or_default();
        record.strings.insert(field.clone(), text);
    }
    for field in &schema.numbers {
        if let Some(n) = raw.get(field).and_then(to_number) {
            record.numbers.insert(field.clone(), n);
        }
    }
    for field in &schema.booleans {
        if let Some(b) = raw.get(field).and_then(to_flag) {
            record.flags.insert(field.clone(), b);
        }
    }

    if schema.lower_tags && raw.contains_key(TAG_FIELD) {
        let tag = raw.get(TAG_FIELD).map(to_text).unwrap_or_default();
        if tag.is_empty() {
            record.tag = Some(TAG_INBOX.into());
        } else {
            record.tag = Some(tag.to_lowercase());
        }
    }

    record.id = match &schema.id_fields {
        Some(fields) => derive_id(&record, raw, fields.iter().map(String::as_str)),
        None => derive_id(&record, raw, DEFAULT_ID_FIELDS.iter().copied()),
    };
    record
}

/// Identity = lower-cased, trimmed identity fields, pipe-joined, empty parts
/// filtered. No parts present means no identity.
fn derive_id<'a>(
    record: &Record,
    raw: &RawRow,
    fields: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let mut parts = Vec::new();
    for field in fields {
        let value = match record.strings.get(field) {
            Some(s) => s.clone(),
            None => raw.get(field).map(to_text).unwrap_or_default(),
        };
        let value = value.trim().to_lowercase();
        if !value.is_empty() {
            parts.push(value);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
