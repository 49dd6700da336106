//! Dataset record creation command.
//!
//! Adds a new record to the metadata document from command-line fields.
//! The document is rewritten sorted, so the new record lands in its
//! proper place.

use network_metadata::{
    merge_entry, DocumentError, EvmMetadata, Kind, MetadataDocument, NetworkType, SourceRecord,
};

use crate::{args::GlobalArgs, ui};

/// Command-line arguments for the `add` command.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The dataset key, matching the catalog's dataset name
    #[arg(long)]
    pub key: String,

    /// The kind classification tag (e.g. evm, solana, substrate)
    #[arg(long, value_parser = clap::value_parser!(Kind))]
    pub kind: Option<Kind>,

    /// Human-readable network name
    #[arg(long)]
    pub display_name: Option<String>,

    /// URL of the network logo
    #[arg(long)]
    pub logo_url: Option<String>,

    /// Whether the network is a mainnet, testnet or devnet
    #[arg(long = "type", value_parser = parse_network_type)]
    pub network_type: Option<NetworkType>,

    /// EVM chain ID, for EVM networks
    #[arg(long)]
    pub chain_id: Option<u64>,

    /// First block the dataset serves
    #[arg(long)]
    pub start_block: Option<u64>,
}

/// Add a dataset record to the metadata document.
///
/// # Errors
///
/// Returns [`Error`] when the key already exists or the document cannot
/// be read or written.
#[tracing::instrument(skip_all, fields(metadata = %args.global.metadata.display(), key = %args.key))]
pub fn run(args: Args) -> Result<(), Error> {
    let Args {
        global,
        key,
        kind,
        display_name,
        logo_url,
        network_type,
        chain_id,
        start_block,
    } = args;

    tracing::debug!("Adding dataset record");

    let mut document = MetadataDocument::load(&global.metadata).map_err(Error::Load)?;

    if document.datasets.contains_key(&key) {
        return Err(Error::DuplicateKey { key });
    }

    let source = SourceRecord {
        kind,
        display_name,
        logo_url,
        network_type,
        evm: chain_id.map(|chain_id| EvmMetadata { chain_id }),
        start_block,
        tables: None,
    };
    let (entry, _) = merge_entry(&source, None, false);

    document.datasets.insert(key.clone(), entry.clone());
    document.save(&global.metadata).map_err(Error::Save)?;

    crate::success!(
        "Added {} to {}",
        ui::dataset(&key),
        ui::path(global.metadata.display())
    );

    // Echo the record as written, so the caller can review it.
    let rendered = serde_yaml::to_string(&entry).map_err(Error::Render)?;
    println!("{key}:");
    for line in rendered.lines() {
        println!("  {line}");
    }

    Ok(())
}

fn parse_network_type(value: &str) -> Result<NetworkType, String> {
    match value {
        "mainnet" => Ok(NetworkType::Mainnet),
        "testnet" => Ok(NetworkType::Testnet),
        "devnet" => Ok(NetworkType::Devnet),
        _ => Err(format!(
            "unknown network type '{value}', expected mainnet, testnet or devnet"
        )),
    }
}

/// Errors for the add command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to load the metadata document
    #[error("failed to load metadata document")]
    Load(#[source] DocumentError),

    /// The dataset key already has a record
    #[error("dataset '{key}' already has a record")]
    DuplicateKey { key: String },

    /// Failed to write the metadata document
    #[error("failed to write metadata document")]
    Save(#[source] DocumentError),

    /// Failed to render the new record for display
    #[error("failed to render the new record")]
    Render(#[source] serde_yaml::Error),
}
