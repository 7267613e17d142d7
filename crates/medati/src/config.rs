use serde::Deserialize;
use thiserror::Error;

use medati_table::{CsvOptions, CsvWriteOptions, BOOKKEEPING_COLUMNS, RESERVED_COLUMNS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("output delimiter must be a single ASCII character, got {0:?}")]
    OutputDelimiter(char),
    #[error("bookkeeping column `{0}` is not a reserved column")]
    UnreservedBookkeeping(String),
}

/// Settings injected into the pipeline at startup.
///
/// Every key is optional in a config file; missing keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Columns of the platform's base schema. Everything else is user-defined.
    pub reserved_columns: Vec<String>,
    /// Reserved columns that receive the provenance blob.
    pub bookkeeping_columns: Vec<String>,
    /// Abort the batch unless exactly this many complete pairs are found.
    pub expected_pairs: Option<usize>,
    pub csv: CsvOptions,
    pub output_delimiter: char,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reserved_columns: RESERVED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            bookkeeping_columns: BOOKKEEPING_COLUMNS.iter().map(|s| s.to_string()).collect(),
            expected_pairs: None,
            csv: CsvOptions::default(),
            output_delimiter: ';',
        }
    }
}

impl PipelineConfig {
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Injected columns must be reserved, or a second run would count them as user columns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.output_delimiter.is_ascii() {
            return Err(ConfigError::OutputDelimiter(self.output_delimiter));
        }
        if let Some(column) = self
            .bookkeeping_columns
            .iter()
            .find(|column| !self.reserved_columns.contains(column))
        {
            return Err(ConfigError::UnreservedBookkeeping(column.clone()));
        }
        Ok(())
    }

    pub fn write_options(&self) -> CsvWriteOptions {
        CsvWriteOptions {
            // `validate` rejects non-ASCII delimiters.
            delimiter: self.output_delimiter as u8,
        }
    }
}
