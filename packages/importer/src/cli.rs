//! Command-line interface for the importer.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::build;
use crate::config::{DEFAULT_OUTPUT_FILE, DEFAULT_SOURCE_URL};
use crate::error::Result;
use crate::export::OutputFormat;
use crate::import::{export_store, run_import, ImportSummary};
use crate::persist::MemoryStore;
use crate::source::{load_entries, SourceLocation};
use crate::types::{NodeId, RegionForest};

/// divcode importer - Rebuild the administrative division tree from a flat code listing.
#[derive(Parser)]
#[command(name = "divcode-importer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the division-code listing comes from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// URL of the published listing
    #[arg(long, conflicts_with = "input")]
    pub url: Option<String>,

    /// Local HTML or plain-text (.txt/.tsv) listing
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl SourceArgs {
    /// Resolve to a source location, defaulting to the published listing.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        match (&self.input, &self.url) {
            (Some(path), _) => SourceLocation::File(path.clone()),
            (None, Some(url)) => SourceLocation::Url(url.clone()),
            (None, None) => SourceLocation::Url(DEFAULT_SOURCE_URL.to_string()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the tree and report its shape without persisting it.
    Build {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the reconstructed tree
        #[arg(long)]
        tree: bool,
    },

    /// Build, persist to an in-memory store and export the nested document.
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: region.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { source, tree } => build_command(&source.location(), tree),
        Commands::Export {
            source,
            output,
            format,
        } => export_command(
            &source.location(),
            output.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT_FILE)),
            format,
        ),
    }
}

/// Create the progress spinner used while loading.
pub fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Load entries behind a spinner.
pub fn load_with_progress(location: &SourceLocation) -> Result<Vec<crate::types::RawEntry>> {
    println!("{} {}", style("Loading").bold(), style(location).cyan());
    println!();

    let pb = spinner();
    pb.set_message("Reading division codes...");
    let entries = load_entries(location);
    pb.finish_and_clear();
    entries
}

/// Execute the build command.
fn build_command(location: &SourceLocation, show_tree: bool) -> Result<()> {
    let entries = load_with_progress(location)?;
    let entry_count = entries.len();
    let forest = build(entries);

    println!("  Entries: {entry_count}");
    println!("  Top-level subtrees: {}", style(forest.roots().len()).green());
    print_warnings(forest.warnings().iter().map(ToString::to_string).collect());

    if show_tree {
        println!();
        for &root in forest.roots() {
            print_tree(&forest, root);
        }
    }

    Ok(())
}

/// Execute the export command.
fn export_command(location: &SourceLocation, output: &Path, format: OutputFormat) -> Result<()> {
    let entries = load_with_progress(location)?;

    let pb = spinner();
    pb.set_message("Building and committing subtrees...");
    let mut store = MemoryStore::new();
    let summary = match run_import(entries, &mut store) {
        Ok(summary) => summary,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message("Writing export...");
    let saved = match export_store(&store, output, format) {
        Ok(path) => path,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    print_summary(&summary);
    println!();
    println!("{} {}", style("Saved to:").green().bold(), saved.display());

    Ok(())
}

/// Print counts and warnings for a completed import.
pub fn print_summary(summary: &ImportSummary) {
    println!("  Entries: {}", summary.entries);
    println!("  Top-level subtrees: {}", style(summary.subtrees.len()).green());
    println!("  Regions committed: {}", summary.committed_regions());
    print_warnings(summary.warnings.iter().map(ToString::to_string).collect());
}

fn print_warnings(warnings: Vec<String>) {
    if warnings.is_empty() {
        return;
    }
    println!("  Warnings: {}", style(warnings.len()).yellow().bold());
    for warning in warnings {
        println!("    {} {warning}", style("!").yellow());
    }
}

fn print_tree(forest: &RegionForest, root: NodeId) {
    for id in forest.preorder(root) {
        let node = forest.node(id);
        println!(
            "{}{} {}",
            "  ".repeat(forest.depth(id)),
            node.name,
            style(&node.division_code).dim()
        );
    }
}
