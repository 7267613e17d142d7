use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use medati_fs::{atomic_write_bytes, ensure_dir};
use medati_metadata::Document;
use medati_table::{write_csv, CsvWriteOptions, Table};

use crate::error::PipelineError;

/// Receives each pair once it has been fully prepared.
pub trait PairSink {
    fn write_pair(
        &mut self,
        key: &str,
        table: &Table,
        document: &Document,
    ) -> Result<(), PipelineError>;
}

/// Writes `<key>.csv` and `<key>.json` into a directory, each file replaced atomically.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    csv: CsvWriteOptions,
}

impl DirectorySink {
    /// Creates `dir` (and its parents) if needed.
    pub fn new(dir: impl AsRef<Path>, csv: CsvWriteOptions) -> Result<Self, PipelineError> {
        let dir = dir.as_ref();
        let dir = ensure_dir(dir).map_err(|err| PipelineError::io(dir, err))?;
        Ok(Self { dir, csv })
    }
}

impl PairSink for DirectorySink {
    /// Both payloads are rendered before either file is touched. If the metadata file cannot
    /// be persisted, the table file is put back the way it was.
    fn write_pair(
        &mut self,
        key: &str,
        table: &Table,
        document: &Document,
    ) -> Result<(), PipelineError> {
        let csv_path = self.dir.join(format!("{key}.csv"));
        let json_path = self.dir.join(format!("{key}.json"));

        let mut csv_bytes = Vec::new();
        write_csv(table, &mut csv_bytes, &self.csv)
            .map_err(|err| PipelineError::io(&csv_path, io::Error::other(err)))?;
        let mut json_bytes = Vec::new();
        document
            .to_writer(&mut json_bytes)
            .map_err(|err| PipelineError::io(&json_path, io::Error::other(err)))?;

        let previous_csv = match fs::read(&csv_path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(PipelineError::io(&csv_path, err)),
        };

        atomic_write_bytes(&csv_path, &csv_bytes)
            .map_err(|err| PipelineError::io(&csv_path, err))?;
        if let Err(err) = atomic_write_bytes(&json_path, &json_bytes) {
            restore(&csv_path, previous_csv.as_deref());
            return Err(PipelineError::io(&json_path, err));
        }

        info!("wrote {} and {}", csv_path.display(), json_path.display());
        Ok(())
    }
}

fn restore(path: &Path, previous: Option<&[u8]>) {
    let result = match previous {
        Some(bytes) => atomic_write_bytes(path, bytes),
        None => fs::remove_file(path),
    };
    if let Err(err) = result {
        warn!("failed to roll back {}: {err}", path.display());
    }
}

/// Accepts every pair without writing anything.
#[derive(Debug, Default)]
pub struct DryRunSink {
    accepted: Vec<String>,
}

impl DryRunSink {
    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }
}

impl PairSink for DryRunSink {
    fn write_pair(&mut self, key: &str, _: &Table, _: &Document) -> Result<(), PipelineError> {
        info!("dry run: {key} not written");
        self.accepted.push(key.to_string());
        Ok(())
    }
}
