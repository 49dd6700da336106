//! Reading, validating and deterministically writing the metadata document.

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::Path,
};

use serde_yaml::{Mapping, Value};

use crate::{
    kind::{Kind, NetworkType},
    BlockNum,
};

/// The top-level metadata document: a mapping from dataset key to record.
///
/// Unrecognized top-level keys are preserved verbatim across a
/// load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetadataDocument {
    pub datasets: BTreeMap<String, DatasetEntry>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A single dataset record: descriptive metadata plus a schema descriptor.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetEntry {
    pub metadata: DatasetMetadata,

    #[serde(default)]
    pub schema: Schema,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DatasetEntry {
    /// Whether this record already carries a kind classification.
    pub fn is_classified(&self) -> bool {
        self.metadata.kind.is_some()
    }

    /// The string this record sorts by, together with its key.
    ///
    /// Unclassified records sort before all classified ones.
    pub fn sort_kind(&self) -> &str {
        self.metadata.kind.as_ref().map(Kind::as_str).unwrap_or("")
    }
}

/// Descriptive fields of a dataset record.
///
/// Every field is optional: records are built up incrementally and the
/// merge policy fills what is absent. Fields this tool does not know
/// about land in the pass-through bag instead of being dropped.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub network_type: Option<NetworkType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm: Option<EvmMetadata>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// EVM-specific sub-object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EvmMetadata {
    pub chain_id: u64,
}

/// The content descriptor of a dataset: which entities it serves and from
/// which block.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_block: Option<BlockNum>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<BTreeSet<String>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MetadataDocument {
    /// Reads and validates a document from the given path.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not a YAML mapping, lacks the
    /// `datasets` top-level key, or has records that do not decode.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let contents =
            std::fs::read_to_string(path).map_err(|err| DocumentError::ReadFile { source: err })?;
        Self::from_yaml(&contents)
    }

    /// Parses a document from a YAML string.
    ///
    /// The top-level shape is validated on the raw value first so a
    /// malformed document fails with a precise error before any record
    /// is decoded.
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        let raw: Value =
            serde_yaml::from_str(yaml).map_err(|err| DocumentError::Parse { source: err })?;

        let Some(mapping) = raw.as_mapping() else {
            return Err(DocumentError::NotAMapping);
        };
        match mapping.get("datasets") {
            Some(Value::Mapping(_)) => {}
            Some(_) | None => return Err(DocumentError::MissingDatasets),
        }

        serde_yaml::from_value(raw).map_err(|err| DocumentError::Decode { source: err })
    }

    /// Serializes the document to YAML with records sorted by (kind, key).
    ///
    /// The output is deterministic: the same document contents always
    /// produce the same bytes, and re-serializing an already sorted
    /// document changes nothing.
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        let mut datasets = Mapping::new();
        for (key, entry) in self.sorted_entries() {
            let value = serde_yaml::to_value(entry)
                .map_err(|err| DocumentError::Serialize { source: err })?;
            datasets.insert(Value::String(key.clone()), value);
        }

        let mut root = Mapping::new();
        root.insert(
            Value::String("datasets".to_string()),
            Value::Mapping(datasets),
        );
        for (key, value) in &self.extra {
            root.insert(Value::String(key.clone()), value.clone());
        }

        serde_yaml::to_string(&Value::Mapping(root))
            .map_err(|err| DocumentError::Serialize { source: err })
    }

    /// Writes the document to the given path, sorted.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|err| DocumentError::WriteFile { source: err })?;
        Ok(())
    }

    /// Records ordered by (kind, key) ascending, ordinal comparison,
    /// unclassified (empty kind) first.
    pub fn sorted_entries(&self) -> Vec<(&String, &DatasetEntry)> {
        let mut entries: Vec<_> = self.datasets.iter().collect();
        entries.sort_by_key(|(key, entry)| (entry.sort_kind(), key.as_str()));
        entries
    }
}

/// Errors that occur while loading or saving the metadata document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read metadata document")]
    ReadFile {
        #[source]
        source: io::Error,
    },

    #[error("failed to parse metadata document")]
    Parse {
        #[source]
        source: serde_yaml::Error,
    },

    /// The document root is not a YAML mapping.
    #[error("expected the metadata document to be a YAML mapping")]
    NotAMapping,

    /// The required `datasets` top-level key is absent or not a mapping.
    #[error("expected a 'datasets' mapping at the top level of the metadata document")]
    MissingDatasets,

    #[error("failed to decode dataset records")]
    Decode {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize metadata document")]
    Serialize {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write metadata document")]
    WriteFile {
        #[source]
        source: io::Error,
    },
}
