//! `medati` prepares CSV tables and their metadata documents for upload.
//!
//! Each `<key>.csv` table in the input directory is paired with `<key>.json`. For every
//! complete pair the table's column names are normalized and the document's field names
//! are reconciled against them. Bookkeeping columns recording the user-defined columns are
//! filled in before both files are written to the output directory.

pub mod cli;
mod config;
mod error;
mod pair;
mod pipeline;
mod report;
mod sink;
mod source;

pub use config::{ConfigError, PipelineConfig};
pub use error::PipelineError;
pub use pair::{complete_keys, pair_up, Pair};
pub use pipeline::{prepare_pair, run_batch};
pub use report::{BatchReport, Counts, PairOutcome, PairReport};
pub use sink::{DirectorySink, DryRunSink, PairSink};
pub use source::{load_dir, InputSet};
