use std::collections::BTreeMap;

use medati_metadata::Document;
use medati_table::Table;

/// A table and its metadata document, associated by key. Either side may be missing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pair {
    pub table: Option<Table>,
    pub metadata: Option<Document>,
}

impl Pair {
    pub fn is_complete(&self) -> bool {
        self.table.is_some() && self.metadata.is_some()
    }
}

/// Combine tables and documents by key. Keys present on one side only are kept, with the
/// other side `None`.
pub fn pair_up(
    tables: BTreeMap<String, Table>,
    documents: BTreeMap<String, Document>,
) -> BTreeMap<String, Pair> {
    let mut pairs: BTreeMap<String, Pair> = BTreeMap::new();
    for (key, table) in tables {
        pairs.entry(key).or_default().table = Some(table);
    }
    for (key, document) in documents {
        pairs.entry(key).or_default().metadata = Some(document);
    }
    pairs
}

/// Keys that have both a table and a document.
pub fn complete_keys(pairs: &BTreeMap<String, Pair>) -> Vec<&str> {
    pairs
        .iter()
        .filter(|(_, pair)| pair.is_complete())
        .map(|(key, _)| key.as_str())
        .collect()
}
