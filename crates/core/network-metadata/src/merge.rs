//! Field-level merge of classification results into dataset records.

use std::collections::BTreeSet;

use crate::{
    document::{DatasetEntry, EvmMetadata},
    kind::{Kind, NetworkType},
    BlockNum,
};

/// The fields a classification run can contribute to a dataset record.
///
/// Only fields that are `Some` participate in the merge; everything else
/// in the existing record is left alone, including pass-through fields
/// this tool does not model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecord {
    pub kind: Option<Kind>,
    pub display_name: Option<String>,
    pub logo_url: Option<String>,
    pub network_type: Option<NetworkType>,
    pub evm: Option<EvmMetadata>,
    pub start_block: Option<BlockNum>,
    pub tables: Option<BTreeSet<String>>,
}

/// How the kind field fared in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindStatus {
    /// The record already carried this kind and it was kept.
    AlreadyClassified(Kind),
    /// The kind was written by this merge.
    NewlyClassified(Kind),
    /// Neither the record nor the source carries a kind.
    Unclassified,
}

/// Outcome of merging one source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub kind: KindStatus,
}

/// Merges `source` into `existing` under the overwrite policy.
///
/// For each field: the source value is written iff `overwrite` is true or
/// the existing field is absent; otherwise the existing value is kept. An
/// absent `existing` produces a fresh record holding exactly the source
/// fields.
pub fn merge_entry(
    source: &SourceRecord,
    existing: Option<&DatasetEntry>,
    overwrite: bool,
) -> (DatasetEntry, MergeReport) {
    let mut merged = existing.cloned().unwrap_or_default();

    let previous_kind = merged.metadata.kind;

    merged.metadata.kind = resolve(source.kind.as_ref(), previous_kind.as_ref(), overwrite);
    merged.metadata.display_name = resolve(
        source.display_name.as_ref(),
        merged.metadata.display_name.as_ref(),
        overwrite,
    );
    merged.metadata.logo_url = resolve(
        source.logo_url.as_ref(),
        merged.metadata.logo_url.as_ref(),
        overwrite,
    );
    merged.metadata.network_type = resolve(
        source.network_type.as_ref(),
        merged.metadata.network_type.as_ref(),
        overwrite,
    );
    merged.metadata.evm = resolve(source.evm.as_ref(), merged.metadata.evm.as_ref(), overwrite);
    merged.schema.start_block = resolve(
        source.start_block.as_ref(),
        merged.schema.start_block.as_ref(),
        overwrite,
    );
    merged.schema.tables = resolve(
        source.tables.as_ref(),
        merged.schema.tables.as_ref(),
        overwrite,
    );

    let kind = match (previous_kind, merged.metadata.kind) {
        (Some(old), Some(new)) if old == new => KindStatus::AlreadyClassified(old),
        (_, Some(new)) => KindStatus::NewlyClassified(new),
        (_, None) => KindStatus::Unclassified,
    };

    (merged, MergeReport { kind })
}

fn resolve<T: Clone>(source: Option<&T>, existing: Option<&T>, overwrite: bool) -> Option<T> {
    match (source, existing) {
        (Some(new), None) => Some(new.clone()),
        (Some(new), Some(_)) if overwrite => Some(new.clone()),
        (_, Some(old)) => Some(old.clone()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DatasetMetadata;

    fn existing_entry() -> DatasetEntry {
        DatasetEntry {
            metadata: DatasetMetadata {
                kind: None,
                display_name: Some("Foo Chain".to_string()),
                logo_url: None,
                network_type: Some(NetworkType::Mainnet),
                evm: None,
                extra: Default::default(),
            },
            ..Default::default()
        }
    }

    fn source() -> SourceRecord {
        SourceRecord {
            kind: Some(Kind::Evm),
            display_name: Some("foo".to_string()),
            logo_url: Some("https://cdn.example.org/foo.png".to_string()),
            network_type: Some(NetworkType::Testnet),
            evm: Some(EvmMetadata { chain_id: 5 }),
            start_block: Some(100),
            tables: None,
        }
    }

    #[test]
    fn fill_missing_sets_kind_and_keeps_display_name() {
        //* Given
        let existing = existing_entry();

        //* When
        let (merged, report) = merge_entry(&source(), Some(&existing), false);

        //* Then
        assert_eq!(merged.metadata.kind, Some(Kind::Evm));
        assert_eq!(report.kind, KindStatus::NewlyClassified(Kind::Evm));
        // Present fields are untouched in fill-missing mode.
        assert_eq!(merged.metadata.display_name.as_deref(), Some("Foo Chain"));
        assert_eq!(merged.metadata.network_type, Some(NetworkType::Mainnet));
        // Absent fields are filled.
        assert_eq!(
            merged.metadata.logo_url.as_deref(),
            Some("https://cdn.example.org/foo.png")
        );
        assert_eq!(merged.schema.start_block, Some(100));
    }

    #[test]
    fn merge_is_idempotent_without_overwrite() {
        //* Given
        let existing = existing_entry();
        let source = source();

        //* When
        let (once, _) = merge_entry(&source, Some(&existing), false);
        let (twice, report) = merge_entry(&source, Some(&once), false);

        //* Then
        assert_eq!(twice, once, "no field may regress on a re-run");
        assert_eq!(report.kind, KindStatus::AlreadyClassified(Kind::Evm));
    }

    #[test]
    fn overwrite_writes_every_present_source_field() {
        //* Given
        let mut existing = existing_entry();
        existing.metadata.kind = Some(Kind::Solana);

        let source = source();

        //* When
        let (merged, report) = merge_entry(&source, Some(&existing), true);

        //* Then
        assert_eq!(merged.metadata.kind, source.kind);
        assert_eq!(merged.metadata.display_name, source.display_name);
        assert_eq!(merged.metadata.logo_url, source.logo_url);
        assert_eq!(merged.metadata.network_type, source.network_type);
        assert_eq!(merged.metadata.evm, source.evm);
        assert_eq!(merged.schema.start_block, source.start_block);
        assert_eq!(report.kind, KindStatus::NewlyClassified(Kind::Evm));
    }

    #[test]
    fn overwrite_keeps_fields_the_source_lacks() {
        //* Given
        let existing = existing_entry();
        let sparse = SourceRecord {
            kind: Some(Kind::Evm),
            ..Default::default()
        };

        //* When
        let (merged, _) = merge_entry(&sparse, Some(&existing), true);

        //* Then
        assert_eq!(merged.metadata.display_name.as_deref(), Some("Foo Chain"));
        assert_eq!(merged.metadata.network_type, Some(NetworkType::Mainnet));
    }

    #[test]
    fn absent_existing_creates_a_record_from_the_source() {
        //* Given
        let source = source();

        //* When
        let (merged, report) = merge_entry(&source, None, false);

        //* Then
        assert_eq!(merged.metadata.kind, Some(Kind::Evm));
        assert_eq!(merged.metadata.display_name.as_deref(), Some("foo"));
        assert_eq!(report.kind, KindStatus::NewlyClassified(Kind::Evm));
    }

    #[test]
    fn unknown_record_fields_survive_a_merge() {
        //* Given
        let mut existing = existing_entry();
        existing
            .extra
            .insert("deprecated".to_string(), serde_yaml::Value::Bool(true));

        //* When
        let (merged, _) = merge_entry(&source(), Some(&existing), true);

        //* Then
        assert_eq!(
            merged.extra.get("deprecated"),
            Some(&serde_yaml::Value::Bool(true))
        );
    }

    #[test]
    fn merge_without_any_kind_reports_unclassified() {
        let (_, report) = merge_entry(&SourceRecord::default(), None, false);
        assert_eq!(report.kind, KindStatus::Unclassified);
    }
}
