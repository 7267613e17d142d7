//! Metadata documents and their reconciliation against normalized table columns.
//!
//! Metadata is authored by hand, independently of the CSV header it describes. After the
//! header has been normalized, [`reconcile`] rewrites every field name in the document to
//! the column it most closely resembles, or fails without touching the document.

mod document;
mod reconcile;
pub mod similarity;

pub use document::{Document, Field, MetadataError, Resource, Schema, SUPPORTED_METADATA_VERSION};
pub use reconcile::{reconcile, ReconcileError};
pub use similarity::{best_match, ratio, NoSimilarMatch, SIMILARITY_THRESHOLD};
