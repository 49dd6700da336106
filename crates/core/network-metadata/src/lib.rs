//! Data model for the sqd-network metadata document.
//!
//! The document is a YAML file with a single required top-level key,
//! `datasets`, mapping a dataset key to an entry of the form
//! `{ metadata: {...}, schema: {...} }`. Documents are read fully into
//! memory, mutated in place and rewritten wholesale; every save re-sorts
//! the records by (kind, key) so diffs stay reviewable.

pub mod document;
pub mod kind;
pub mod merge;

pub use document::{DatasetEntry, DatasetMetadata, DocumentError, EvmMetadata, MetadataDocument, Schema};
pub use kind::{Kind, NetworkType};
pub use merge::{merge_entry, KindStatus, MergeReport, SourceRecord};

/// Block height used as the reference point for capability probes and
/// schema start blocks.
pub type BlockNum = u64;
