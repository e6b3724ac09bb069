//! Turns store rows into JSON objects.

use serde_json::{Map, Value};

/// Zips `fields` with `row`, skipping every field named in `exclude`.
///
/// `row` must carry one value per field; queries select their columns in the
/// same order as the entity's field list.
pub fn shape(fields: &[&str], row: &[Value], exclude: &[&str]) -> Map<String, Value> {
    debug_assert_eq!(fields.len(), row.len(), "row shape does not match field list");
    fields
        .iter()
        .zip(row.iter())
        .filter(|(name, _)| !exclude.contains(name))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Like [`shape`], an absent row yields an empty object.
pub fn shape_optional(fields: &[&str], row: Option<&[Value]>, exclude: &[&str]) -> Map<String, Value> {
    row.map(|r| shape(fields, r, exclude)).unwrap_or_default()
}

/// `[(id, fields-without-id)]` pairs for collection responses. The id is the first column.
pub fn keyed(fields: &[&str], rows: &[Vec<Value>]) -> Vec<(Value, Map<String, Value>)> {
    rows.iter()
        .map(|row| (row.first().cloned().unwrap_or(Value::Null), shape(fields, row, &["id"])))
        .collect()
}
