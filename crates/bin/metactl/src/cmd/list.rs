//! Dataset listing command.
//!
//! Loads the metadata document and prints one line per record in sorted
//! order: key, kind and display name.

use network_metadata::{DocumentError, Kind, MetadataDocument, NetworkType};

use crate::args::GlobalArgs;

/// Command-line arguments for the `list` command.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Only list records without a kind classification
    #[arg(long)]
    pub unclassified: bool,
}

/// List the dataset records of the metadata document.
///
/// # Errors
///
/// Returns [`Error`] when the document cannot be read or fails validation.
#[tracing::instrument(skip_all, fields(metadata = %global.metadata.display()))]
pub fn run(Args { global, unclassified }: Args) -> Result<(), Error> {
    tracing::debug!("Listing metadata document records");

    let document = MetadataDocument::load(&global.metadata).map_err(Error::Load)?;

    for (key, entry) in document.sorted_entries() {
        if unclassified && entry.is_classified() {
            continue;
        }

        let kind = entry.metadata.kind.as_ref().map(Kind::as_str).unwrap_or("-");
        let network_type = entry
            .metadata
            .network_type
            .as_ref()
            .map(NetworkType::as_str)
            .unwrap_or("-");
        let display_name = entry.metadata.display_name.as_deref().unwrap_or("");
        println!("{key}\t{kind}\t{network_type}\t{display_name}");
    }

    Ok(())
}

/// Errors for the list command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to load the metadata document
    #[error("failed to load metadata document")]
    Load(#[source] DocumentError),
}
