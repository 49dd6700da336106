//! Dataset classification command.
//!
//! Reconciles the metadata document with the catalog by:
//! 1. Listing the datasets the catalog serves and checking both inventories agree
//! 2. Probing the capabilities of every dataset needing classification, in batches
//! 3. Merging the inferred kind and source metadata into the document
//! 4. Rewriting the document sorted by (kind, key)
//!
//! # Configuration
//!
//! - Catalog URL: `--catalog-url` flag or `SQD_CATALOG_URL` env var
//! - Document path: `--metadata` flag or `SQD_METADATA_PATH` env var (default: `metadata.yml`)
//! - Batch size: `--batch-size` flag or `SQD_BATCH_SIZE` env var (default: 10)
//! - Logging: `SQD_LOG` env var (`error`, `warn`, `info`, `debug`, `trace`)

use std::{
    collections::BTreeSet,
    io,
    path::{Path, PathBuf},
};

use catalog_client::Client;
use futures::future::join_all;
use network_metadata::{
    merge_entry, DocumentError, KindStatus, MetadataDocument, SourceRecord,
};

use crate::{
    args::{CatalogArgs, GlobalArgs},
    ui,
};

/// Command-line arguments for the `update` command.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Overwrite field values already present in the document
    ///
    /// By default a classification result only fills fields the document
    /// does not have yet.
    #[arg(long)]
    pub overwrite: bool,

    /// Re-classify every dataset, not only the unclassified ones
    #[arg(long)]
    pub full_update: bool,

    /// Where to write the keys of catalog datasets the document lacks
    #[arg(long, default_value = "missing-networks.txt")]
    pub missing_out: PathBuf,
}

/// Classify datasets against the catalog and merge the results into the
/// metadata document.
///
/// A failing dataset does not cancel the siblings of its batch, but the
/// run stops after that batch and nothing is persisted.
///
/// # Errors
///
/// Returns [`Error`] when the document is invalid, the inventories
/// disagree, or any dataset failed to classify.
#[tracing::instrument(skip_all, fields(metadata = %global.metadata.display(), catalog_url = %catalog.catalog_url))]
pub async fn run(
    Args {
        global,
        catalog,
        overwrite,
        full_update,
        missing_out,
    }: Args,
) -> Result<(), Error> {
    // The document is validated before any network traffic, so a broken
    // file fails fast.
    let mut document = MetadataDocument::load(&global.metadata).map_err(Error::Load)?;
    let client = catalog.build_client().map_err(Error::BuildClient)?;

    tracing::debug!("Listing catalog datasets");
    let remote = client.datasets().await.map_err(Error::ListDatasets)?;
    let remote_keys: BTreeSet<String> = remote.into_iter().map(|d| d.dataset).collect();

    // Catalog datasets with no record need a human to add one; their keys
    // go to a file for follow-up and the run fails.
    let missing: Vec<&str> = remote_keys
        .iter()
        .filter(|key| !document.datasets.contains_key(*key))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        write_missing(&missing_out, &missing)?;
        crate::warning!(
            "{} catalog dataset(s) have no record, keys written to {}",
            missing.len(),
            ui::path(missing_out.display())
        );
        return Err(Error::MissingFromDocument {
            count: missing.len(),
            path: missing_out,
        });
    }

    // Records whose dataset the catalog no longer serves are stale.
    let absent: Vec<String> = document
        .datasets
        .keys()
        .filter(|key| !remote_keys.contains(*key))
        .cloned()
        .collect();
    if !absent.is_empty() {
        return Err(Error::AbsentFromRemote {
            datasets: absent.join(", "),
        });
    }

    let work: Vec<String> = document
        .datasets
        .iter()
        .filter(|(_, entry)| full_update || !entry.is_classified())
        .map(|(key, _)| key.clone())
        .collect();

    if work.is_empty() {
        crate::info!("All dataset records are classified, nothing to do");
        return Ok(());
    }

    tracing::info!(
        datasets = work.len(),
        batch_size = catalog.batch_size,
        "Classifying datasets"
    );

    // Batches bound the number of in-flight probe requests; a failing
    // dataset does not cancel the siblings of its batch.
    let mut classified = Vec::with_capacity(work.len());
    for batch in work.chunks(catalog.batch_size.max(1)) {
        let outcomes = join_all(
            batch
                .iter()
                .map(|key| async { (key.clone(), classify_dataset(&client, key).await) }),
        )
        .await;

        let mut failed = 0;
        for (key, result) in outcomes {
            match result {
                Ok(source) => classified.push((key, source)),
                Err(err) => {
                    tracing::error!(dataset = %key, error = %err, "Failed to classify dataset");
                    crate::warning!("{}: {err}", ui::dataset(&key));
                    failed += 1;
                }
            }
        }

        // A failed batch stops the run before the next one; nothing is
        // persisted.
        if failed > 0 {
            return Err(Error::DatasetsFailed { failed });
        }
    }

    for (key, source) in classified {
        let (entry, report) = merge_entry(&source, document.datasets.get(&key), overwrite);
        match report.kind {
            KindStatus::NewlyClassified(kind) => {
                crate::success!("{} classified as {kind}", ui::dataset(&key));
            }
            KindStatus::AlreadyClassified(kind) => {
                crate::detail!("{key} already classified as {kind}");
            }
            KindStatus::Unclassified => {}
        }
        document.datasets.insert(key, entry);
    }

    document.save(&global.metadata).map_err(Error::Save)?;

    crate::success!("Updated {}", ui::path(global.metadata.display()));
    Ok(())
}

/// Classify one dataset: resolve its head block, fetch its source
/// metadata and infer its kind from capability probes.
#[tracing::instrument(skip(client))]
async fn classify_dataset(client: &Client, dataset: &str) -> Result<SourceRecord, DatasetError> {
    let head = client
        .head(dataset)
        .await
        .map_err(DatasetError::Head)?
        .ok_or(DatasetError::NoHead)?;

    let metadata = client.metadata(dataset).await.map_err(DatasetError::Metadata)?;
    let start_block = metadata.and_then(|metadata| metadata.start_block);

    let kind = classifier::classify(&client.prober(dataset), head)
        .await
        .map_err(DatasetError::Probe)?
        .ok_or(DatasetError::Unclassifiable)?;

    tracing::debug!(kind = %kind, ?start_block, "Classified dataset");

    Ok(SourceRecord {
        kind: Some(kind),
        start_block,
        ..Default::default()
    })
}

fn write_missing(path: &Path, missing: &[&str]) -> Result<(), Error> {
    let mut contents = missing.join("\n");
    contents.push('\n');
    std::fs::write(path, contents).map_err(|source| Error::WriteMissing {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors for the update command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to load the metadata document
    #[error("failed to load metadata document")]
    Load(#[source] DocumentError),

    /// Failed to build the catalog client
    #[error("failed to build catalog client")]
    BuildClient(#[source] catalog_client::BuildError),

    /// Failed to list the catalog datasets
    #[error("failed to list catalog datasets")]
    ListDatasets(#[source] catalog_client::Error),

    /// Failed to write the missing-datasets file
    #[error("failed to write missing dataset keys to {}", path.display())]
    WriteMissing {
        path: PathBuf,
        source: io::Error,
    },

    /// The catalog serves datasets the document has no record for
    #[error("{count} catalog dataset(s) have no record, keys written to {}", path.display())]
    MissingFromDocument { count: usize, path: PathBuf },

    /// The document has records for datasets the catalog no longer serves
    #[error("dataset record(s) absent from the catalog: {datasets}")]
    AbsentFromRemote { datasets: String },

    /// One or more datasets failed to classify
    #[error("{failed} dataset(s) failed to classify")]
    DatasetsFailed { failed: usize },

    /// Failed to write the metadata document
    #[error("failed to write metadata document")]
    Save(#[source] DocumentError),
}

/// Failure classifying a single dataset.
#[derive(Debug, thiserror::Error)]
enum DatasetError {
    /// Failed to fetch the dataset head
    #[error("failed to fetch head")]
    Head(#[source] catalog_client::Error),

    /// The catalog serves no head block for the dataset
    #[error("no head block available")]
    NoHead,

    /// Failed to fetch the dataset source metadata
    #[error("failed to fetch metadata")]
    Metadata(#[source] catalog_client::Error),

    /// A capability probe failed
    #[error("capability probe failed")]
    Probe(#[source] catalog_client::Error),

    /// No classification rule matched the probed capabilities
    #[error("no classification rule matched")]
    Unclassifiable,
}
