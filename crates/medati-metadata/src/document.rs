use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Metadata version prefix the reconciler is written against (`OEP-1.5`, `OEP-1.5.2`, ...).
pub const SUPPORTED_METADATA_VERSION: &str = "OEP-1.5";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("invalid metadata json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A metadata document: a name and the resources it describes.
///
/// Only the parts the reconciler touches are typed. Every other key (licenses, contributors,
/// `metaMetadata`, ...) is kept in `extra` and written back unchanged, in its original order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A described column. The name is the only attribute reconciliation rewrites.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Document {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Write the document as pretty-printed UTF-8 JSON (non-ASCII kept literally).
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), MetadataError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Fields of every resource, in declared order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.resources
            .iter()
            .filter_map(|resource| resource.schema.as_ref())
            .flat_map(|schema| schema.fields.iter())
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.resources
            .iter_mut()
            .filter_map(|resource| resource.schema.as_mut())
            .flat_map(|schema| schema.fields.iter_mut())
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields().map(|field| field.name().to_string()).collect()
    }

    /// `metaMetadata.metadataVersion`, if the document declares one.
    pub fn metadata_version(&self) -> Option<&str> {
        self.extra
            .get("metaMetadata")
            .and_then(|meta| meta.get("metadataVersion"))
            .and_then(Value::as_str)
    }

    /// Documents without a declared version are accepted as-is.
    pub fn has_supported_version(&self) -> bool {
        self.metadata_version()
            .map_or(true, |version| version.starts_with(SUPPORTED_METADATA_VERSION))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
