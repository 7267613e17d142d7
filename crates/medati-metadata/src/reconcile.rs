use log::debug;
use thiserror::Error;

use crate::document::Document;
use crate::similarity::{best_match, NoSimilarMatch};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("metadata `{document}`: field `{field}` does not match any column")]
pub struct ReconcileError {
    pub document: String,
    /// Field name as written in the document, before lowercasing.
    pub field: String,
    #[source]
    pub source: NoSimilarMatch,
}

/// Rename every field of `document` to the column in `candidates` it most closely resembles.
///
/// Field names are lowercased before matching; the chosen candidate is stored verbatim. Every
/// field is matched before any is renamed, so on error the document is left untouched.
pub fn reconcile<S: AsRef<str>>(
    document: &mut Document,
    candidates: &[S],
) -> Result<(), ReconcileError> {
    let mut resolved = Vec::new();
    for field in document.fields() {
        let matched =
            best_match(candidates, &field.name().to_lowercase()).map_err(|source| ReconcileError {
                document: document.display_name().to_string(),
                field: field.name().to_string(),
                source,
            })?;
        resolved.push(matched);
    }

    for (field, column) in document.fields_mut().zip(resolved) {
        if field.name() != column {
            debug!("metadata field `{}` -> column `{column}`", field.name());
        }
        field.rename(column);
    }
    Ok(())
}
