//! User-defined columns and the bookkeeping columns derived from them.
//!
//! The platform's base data model reserves a fixed set of column names. Anything else
//! in a table is "user-defined"; the pipeline records those names in a JSON blob that is
//! written into each bookkeeping column so provenance, version and method can be filled
//! in per user column after upload.

use std::collections::BTreeSet;

use crate::table::Table;
use crate::value::Value;

/// Column names that belong to the platform's base data model.
pub const RESERVED_COLUMNS: [&str; 11] = [
    "id",
    "region",
    "year",
    "timeindex_resolution",
    "timeindex_start",
    "timeindex_stop",
    "bandwidth_type",
    "version",
    "method",
    "source",
    "comment",
];

/// Reserved columns that receive the user-column blob.
pub const BOOKKEEPING_COLUMNS: [&str; 5] =
    ["bandwidth_type", "version", "method", "source", "comment"];

/// Columns of `table` that are not in `reserved`.
pub fn user_defined_columns<S: AsRef<str>>(table: &Table, reserved: &[S]) -> BTreeSet<String> {
    table
        .columns()
        .iter()
        .map(|c| c.name())
        .filter(|name| !reserved.iter().any(|r| r.as_ref() == *name))
        .map(str::to_string)
        .collect()
}

/// Render the user-column set as a JSON object mapping each name to an empty string.
///
/// Keys are sorted, so the blob is stable across runs.
pub fn provenance_blob(user_columns: &BTreeSet<String>) -> String {
    let object: serde_json::Map<String, serde_json::Value> = user_columns
        .iter()
        .map(|name| (name.clone(), serde_json::Value::String(String::new())))
        .collect();
    serde_json::Value::Object(object).to_string()
}

/// Fill every column in `bookkeeping` with `blob`, appending missing columns.
pub fn inject_bookkeeping_columns<S: AsRef<str>>(table: &mut Table, bookkeeping: &[S], blob: &str) {
    let value = Value::string(blob);
    for column in bookkeeping {
        table.fill_column(column.as_ref(), value.clone());
    }
}
