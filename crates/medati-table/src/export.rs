use std::io::Write;

use thiserror::Error;

use crate::table::Table;

#[derive(Clone, Debug)]
pub struct CsvWriteOptions {
    pub delimiter: u8,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        // The upload tooling reads `;`-separated files.
        Self { delimiter: b';' }
    }
}

#[derive(Debug, Error)]
pub enum CsvExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write `table` as CSV: a header row followed by one record per row.
pub fn write_csv<W: Write>(
    table: &Table,
    writer: W,
    options: &CsvWriteOptions,
) -> Result<(), CsvExportError> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    out.write_record(table.columns().iter().map(|c| c.name()))?;
    for row in 0..table.row_count() {
        out.write_record(table.row(row).map(|v| v.to_field().into_owned()))?;
    }
    out.flush()?;
    Ok(())
}
