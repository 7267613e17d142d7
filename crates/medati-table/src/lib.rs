//! `medati-table` holds the tabular side of the medati pipeline.
//!
//! A [`Table`] is an ordered list of named columns read from a CSV file. The crate
//! provides:
//! - CSV import with delimiter sniffing and per-column type inference ([`import`])
//! - CSV export in the platform's upload convention ([`export`])
//! - the column-name normalizer ([`normalize`])
//! - user-defined column extraction and bookkeeping-column injection ([`user_columns`])

pub mod export;
pub mod import;
pub mod normalize;
mod table;
pub mod user_columns;
mod value;

pub use export::{write_csv, CsvExportError, CsvWriteOptions};
pub use import::{
    read_csv_table, sniff_delimiter, CsvDelimiter, CsvImportError, CsvOptions, CsvTextEncoding,
};
pub use normalize::{normalize_column_name, normalize_column_names};
pub use table::{Column, Table, TableError};
pub use user_columns::{
    inject_bookkeeping_columns, provenance_blob, user_defined_columns, BOOKKEEPING_COLUMNS,
    RESERVED_COLUMNS,
};
pub use value::{ColumnType, Value};
