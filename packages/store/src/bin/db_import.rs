use std::path::PathBuf;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use divcode_importer::cli::{print_summary, SourceArgs};
use divcode_importer::export::OutputFormat;
use divcode_importer::import::{export_store, run_import};
use divcode_importer::source::load_entries;

use divcode_store::config::StoreConfig;
use divcode_store::error::Result;
use divcode_store::PgRegionStore;

/// Import the division tree into PostgreSQL.
///
/// Reads the database location from `DATABASE_URL`.
#[derive(Parser)]
#[command(name = "divcode-db-import")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Remove existing regions before importing
    #[arg(long)]
    replace: bool,

    /// Also export the stored tree to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn run(cli: Cli) -> Result<()> {
    let config = StoreConfig::from_env()?;
    let location = cli.source.location();

    let entries = load_entries(&location)?;

    let mut store = PgRegionStore::connect(&config)?;
    if cli.replace {
        store.truncate()?;
    }

    let summary = run_import(entries, &mut store)?;
    print_summary(&summary);

    if let Some(output) = cli.output {
        let saved = export_store(&store, &output, cli.format)?;
        println!("{} {}", style("Saved to:").green().bold(), saved.display());
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "import failed");
        std::process::exit(1);
    }
}
