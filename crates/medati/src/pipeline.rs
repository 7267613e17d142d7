use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use medati_metadata::{reconcile, Document};
use medati_table::{inject_bookkeeping_columns, provenance_blob, user_defined_columns, Table};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::pair::{complete_keys, Pair};
use crate::report::{BatchReport, PairOutcome};
use crate::sink::PairSink;

/// Prepare one table/document pair for upload.
///
/// Normalizes the table's column names, reconciles the document's field names against them,
/// then writes the provenance blob of the user-defined columns into every bookkeeping column.
/// On error the pair must be discarded: the table may already be normalized.
pub fn prepare_pair(
    key: &str,
    table: &mut Table,
    document: &mut Document,
    config: &PipelineConfig,
) -> Result<(), PipelineError> {
    table
        .normalize_columns()
        .map_err(|err| PipelineError::MalformedInput {
            input: format!("table `{key}`"),
            reason: err.to_string(),
        })?;

    reconcile(document, &table.column_names())?;

    let user_columns = user_defined_columns(table, &config.reserved_columns);
    let blob = provenance_blob(&user_columns);
    inject_bookkeeping_columns(table, &config.bookkeeping_columns, &blob);
    Ok(())
}

/// Run every pair through [`prepare_pair`] and hand the successful ones to `sink`.
///
/// `rejected` holds keys whose input files could not be loaded; they are reported as failed
/// without being prepared. With `expected_pairs` configured, a different number of complete
/// pairs aborts the batch before any pair is touched. Otherwise a failing pair is recorded in
/// the report and the remaining pairs still run.
pub fn run_batch(
    mut pairs: BTreeMap<String, Pair>,
    mut rejected: BTreeMap<String, PipelineError>,
    config: &PipelineConfig,
    sink: &mut dyn PairSink,
) -> Result<BatchReport, PipelineError> {
    check_pair_count(&pairs, &rejected, config.expected_pairs)?;

    for key in rejected.keys() {
        pairs.entry(key.clone()).or_default();
    }

    let mut report = BatchReport::default();
    for (key, pair) in pairs {
        if let Some(err) = rejected.remove(&key) {
            report.push(&key, failed(&key, &err));
            continue;
        }
        let outcome = match (pair.table, pair.metadata) {
            (Some(mut table), Some(mut document)) => {
                match prepare_pair(&key, &mut table, &mut document, config)
                    .and_then(|()| sink.write_pair(&key, &table, &document))
                {
                    Ok(()) => {
                        info!("prepared {key}");
                        PairOutcome::Written
                    }
                    Err(err) => failed(&key, &err),
                }
            }
            (Some(_), None) => {
                warn!("table {key} has no metadata document");
                PairOutcome::MissingMetadata
            }
            (None, Some(_)) => {
                warn!("metadata {key} has no table");
                PairOutcome::MissingTable
            }
            (None, None) => continue,
        };
        report.push(&key, outcome);
    }
    Ok(report)
}

fn failed(key: &str, err: &PipelineError) -> PairOutcome {
    let error = error_chain(err);
    warn!("{key}: {error}");
    PairOutcome::Failed { error }
}

/// Rejected keys never count as complete, and are listed with the one-sided keys.
fn check_pair_count(
    pairs: &BTreeMap<String, Pair>,
    rejected: &BTreeMap<String, PipelineError>,
    expected: Option<usize>,
) -> Result<(), PipelineError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = complete_keys(pairs)
        .into_iter()
        .filter(|key| !rejected.contains_key(*key))
        .count();
    if actual == expected {
        return Ok(());
    }

    let unpaired: BTreeSet<&String> = pairs
        .iter()
        .filter(|(_, pair)| !pair.is_complete())
        .map(|(key, _)| key)
        .chain(rejected.keys())
        .collect();
    Err(PipelineError::PairCountMismatch {
        expected,
        actual,
        unpaired: unpaired.into_iter().cloned().collect(),
    })
}

/// `err` followed by each of its sources, joined with `: `.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        out.push_str(": ");
        out.push_str(&err.to_string());
        source = err.source();
    }
    out
}
