use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use medati_metadata::Document;
use medati_table::{read_csv_table, CsvOptions, Table};
use walkdir::WalkDir;

use crate::error::PipelineError;
use crate::pipeline::error_chain;

/// Tables and metadata documents found in one input directory, keyed by file stem.
///
/// Files that could not be read or parsed end up in `failed` under their key, so the batch can
/// report them while the other keys still run.
#[derive(Debug, Default)]
pub struct InputSet {
    pub tables: BTreeMap<String, Table>,
    pub documents: BTreeMap<String, Document>,
    pub failed: BTreeMap<String, PipelineError>,
}

impl InputSet {
    /// The first failure per key is kept; later ones are only logged.
    fn reject(&mut self, key: String, err: PipelineError) {
        match self.failed.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(err);
            }
            Entry::Occupied(slot) => warn!("{}: {}", slot.key(), error_chain(&err)),
        }
    }
}

#[derive(Clone, Copy)]
enum InputKind {
    Table,
    Metadata,
}

/// Load every `*.csv` table and `*.json` document directly inside `dir`.
///
/// Subdirectories and other files are ignored. Only an unreadable directory is an error; a bad
/// file is recorded in [`InputSet::failed`].
pub fn load_dir(dir: &Path, csv: &CsvOptions) -> Result<InputSet, PipelineError> {
    let mut inputs = InputSet::default();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            PipelineError::io(path, err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        let kind = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => InputKind::Table,
            Some("json") => InputKind::Metadata,
            _ => continue,
        };
        let key = match file_key(path) {
            Ok(key) => key,
            Err(err) => {
                let key = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                inputs.reject(key, err);
                continue;
            }
        };
        if let Err(err) = load_file(path, kind, &key, csv, &mut inputs) {
            inputs.reject(key, err);
        }
    }

    Ok(inputs)
}

fn load_file(
    path: &Path,
    kind: InputKind,
    key: &str,
    csv: &CsvOptions,
    inputs: &mut InputSet,
) -> Result<(), PipelineError> {
    let bytes = fs::read(path).map_err(|err| PipelineError::io(path, err))?;

    match kind {
        InputKind::Table => {
            let table = read_csv_table(&bytes, csv).map_err(|err| malformed(path, err))?;
            if inputs.tables.contains_key(key) {
                return Err(duplicate(path, key));
            }
            info!(
                "loaded table {key}: {} columns, {} rows",
                table.column_count(),
                table.row_count()
            );
            inputs.tables.insert(key.to_string(), table);
        }
        InputKind::Metadata => {
            let document =
                Document::from_json_slice(&bytes).map_err(|err| malformed(path, err))?;
            if inputs.documents.contains_key(key) {
                return Err(duplicate(path, key));
            }
            if !document.has_supported_version() {
                warn!(
                    "{}: metadata version {:?} is not {}",
                    path.display(),
                    document.metadata_version().unwrap_or_default(),
                    medati_metadata::SUPPORTED_METADATA_VERSION
                );
            }
            info!("loaded metadata {key}: {} fields", document.fields().count());
            inputs.documents.insert(key.to_string(), document);
        }
    }
    Ok(())
}

fn file_key(path: &Path) -> Result<String, PipelineError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::MalformedInput {
            input: path.display().to_string(),
            reason: "file name is not valid UTF-8".to_string(),
        })
}

fn malformed(path: &Path, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::MalformedInput {
        input: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn duplicate(path: &Path, key: &str) -> PipelineError {
    PipelineError::MalformedInput {
        input: path.display().to_string(),
        reason: format!("another file already uses the key `{key}`"),
    }
}
