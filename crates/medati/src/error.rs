use std::io;
use std::path::PathBuf;

use medati_metadata::ReconcileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A metadata field has no similar column. Carries the underlying `NoSimilarMatch`.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(
        "expected {expected} table/metadata pairs, found {actual} (unpaired: {})",
        .unpaired.join(", ")
    )]
    PairCountMismatch {
        expected: usize,
        actual: usize,
        unpaired: Vec<String>,
    },
    /// `input` is the offending file, or the pairing key for data already in memory.
    #[error("malformed input {input}: {reason}")]
    MalformedInput { input: String, reason: String },
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
