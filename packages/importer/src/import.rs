//! Import service that ties all components together.

use std::path::{Path, PathBuf};

use crate::builder::build;
use crate::error::{ImporterError, Result};
use crate::export::{assemble, save_documents, OutputFormat, RegionDocument};
use crate::persist::{persist_forest, CommittedSubtree, RegionStore};
use crate::types::{BuildWarning, RawEntry};

/// Outcome of a completed import.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    /// Number of entries read from the source.
    pub entries: usize,

    /// Top-level subtrees in commit order.
    pub subtrees: Vec<CommittedSubtree>,

    /// Non-fatal data-quality findings.
    pub warnings: Vec<BuildWarning>,
}

impl ImportSummary {
    /// Total number of regions committed.
    #[must_use]
    pub fn committed_regions(&self) -> usize {
        self.subtrees.iter().map(|s| s.node_count).sum()
    }
}

/// Build the tree from `entries` and commit it to `store`.
///
/// # Returns
/// A summary of what was committed, or the first commit failure. Subtrees
/// committed before a failure remain in the store.
pub fn run_import<S: RegionStore>(entries: Vec<RawEntry>, store: &mut S) -> Result<ImportSummary> {
    let entry_count = entries.len();
    let forest = build(entries);

    for warning in forest.warnings() {
        tracing::debug!(%warning, "Data-quality warning");
    }

    let subtrees = persist_forest(&forest, store)?;

    tracing::info!(
        entries = entry_count,
        subtrees = subtrees.len(),
        warnings = forest.warnings().len(),
        "Import complete"
    );

    Ok(ImportSummary {
        entries: entry_count,
        subtrees,
        warnings: forest.warnings().to_vec(),
    })
}

/// Read every committed region back from `store` as nested documents.
pub fn read_documents<S: RegionStore>(store: &S) -> Result<Vec<RegionDocument>> {
    let records = store
        .load_all()
        .map_err(|e| ImporterError::StoreRead(Box::new(e)))?;
    Ok(assemble(records))
}

/// Export the committed tree in `store` to `path`.
pub fn export_store<S: RegionStore>(
    store: &S,
    path: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let documents = read_documents(store)?;
    save_documents(&documents, path, format)
}
