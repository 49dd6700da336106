//! Document sorting command.
//!
//! Loads the metadata document, validates its shape and rewrites it with
//! records ordered by (kind, key). Running it on an already sorted
//! document changes nothing.
//!
//! # Configuration
//!
//! - Document path: `--metadata` flag or `SQD_METADATA_PATH` env var (default: `metadata.yml`)
//! - Logging: `SQD_LOG` env var (`error`, `warn`, `info`, `debug`, `trace`)

use network_metadata::{DocumentError, MetadataDocument};

use crate::{args::GlobalArgs, ui};

/// Command-line arguments for the `sort` command.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Rewrite the metadata document in sorted order.
///
/// # Errors
///
/// Returns [`Error`] when the document cannot be read, fails validation,
/// or cannot be written back.
#[tracing::instrument(skip_all, fields(metadata = %global.metadata.display()))]
pub fn run(Args { global }: Args) -> Result<(), Error> {
    tracing::debug!("Sorting metadata document");

    let document = MetadataDocument::load(&global.metadata).map_err(Error::Load)?;
    document.save(&global.metadata).map_err(Error::Save)?;

    crate::success!(
        "Sorted {} dataset records in {}",
        document.datasets.len(),
        ui::path(global.metadata.display())
    );

    Ok(())
}

/// Errors for the sort command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to load the metadata document
    #[error("failed to load metadata document")]
    Load(#[source] DocumentError),

    /// Failed to write the metadata document
    #[error("failed to write metadata document")]
    Save(#[source] DocumentError),
}
