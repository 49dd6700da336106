use clap::Parser as _;
use metactl::{cmd, logging};

#[tokio::main]
async fn main() {
    // Initialize tracing for debug logs
    logging::init();

    if let Err(err) = run().await {
        metactl::error!(err);
        std::process::exit(1);
    }
}

/// Maintenance CLI for the sqd-network metadata document
#[derive(Debug, clap::Parser)]
#[command(name = "metactl")]
#[command(about = "metactl maintains the sqd-network dataset metadata document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Classify datasets against the catalog and merge the results
    ///
    /// Lists the datasets the catalog serves, probes the capabilities of every
    /// unclassified dataset (all of them with --full-update) to infer its kind,
    /// and merges kind, start block and other discovered fields into the
    /// metadata document. Existing field values are kept unless --overwrite is
    /// given. The document is rewritten sorted by (kind, key).
    Update(cmd::update::Args),

    /// Rewrite the metadata document sorted by (kind, key)
    ///
    /// Loads, validates and rewrites the document without touching any field.
    /// Records are ordered by kind first (unclassified entries come before all
    /// classified ones) and by key within a kind, so diffs stay reviewable.
    Sort(cmd::sort::Args),

    /// Add a dataset record to the metadata document
    Add(cmd::add::Args),

    /// List the dataset records of the metadata document
    #[command(alias = "ls")]
    List(cmd::list::Args),
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Update(args) => cmd::update::run(args).await?,
        Commands::Sort(args) => cmd::sort::run(args)?,
        Commands::Add(args) => cmd::add::run(args)?,
        Commands::List(args) => cmd::list::run(args)?,
    }

    Ok(())
}
