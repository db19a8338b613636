//! Nested document output for committed regions.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ImporterError, Result};
use crate::types::{RegionId, RegionRecord};

/// Output document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// One region in the exported document, with its children nested in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDocument {
    pub id: RegionId,
    pub name: String,
    pub division_code: String,
    pub full_name: String,
    pub parent_id: Option<RegionId>,
    pub children: Vec<RegionDocument>,
}

impl RegionDocument {
    /// Total number of regions in this document, including itself.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RegionDocument::count).sum::<usize>()
    }
}

/// Rebuild nested documents from flat store rows.
///
/// Siblings are ordered by materialized path code, which encodes document
/// order; the identity breaks ties. Rows whose parent is missing from the
/// input are promoted to the top level with a warning.
#[must_use]
pub fn assemble(mut records: Vec<RegionRecord>) -> Vec<RegionDocument> {
    records.sort_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)));

    let known: HashSet<RegionId> = records.iter().map(|r| r.id).collect();
    let mut children: HashMap<RegionId, Vec<RegionRecord>> = HashMap::new();
    let mut roots = Vec::new();

    for record in records {
        match record.parent_id {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(record);
            }
            Some(parent) => {
                tracing::warn!(id = record.id, parent, "Parent not found, exporting at top level");
                roots.push(record);
            }
            None => roots.push(record),
        }
    }

    roots
        .into_iter()
        .map(|record| nest(record, &mut children))
        .collect()
}

fn nest(
    record: RegionRecord,
    children: &mut HashMap<RegionId, Vec<RegionRecord>>,
) -> RegionDocument {
    let kids = children.remove(&record.id).unwrap_or_default();
    RegionDocument {
        id: record.id,
        name: record.name,
        division_code: record.division_code,
        full_name: record.full_name,
        parent_id: record.parent_id,
        children: kids.into_iter().map(|kid| nest(kid, children)).collect(),
    }
}

/// Serialize documents in the requested format.
pub fn render(documents: &[RegionDocument], format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(documents)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml_ng::to_string(documents)?,
    };
    Ok(content)
}

/// Save documents to `path`.
///
/// Uses atomic write pattern: writes to temp file, syncs to disk, then renames.
/// An existing export is never left half-written.
pub fn save_documents(
    documents: &[RegionDocument],
    path: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let content = render(documents, format)?;
    let export_err = |source| ImporterError::Export {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(export_err)?;
    }

    {
        let mut file = File::create(&temp_file).map_err(export_err)?;
        file.write_all(content.as_bytes()).map_err(export_err)?;
        file.sync_all().map_err(export_err)?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path).map_err(export_err)?;
    }

    fs::rename(&temp_file, path).map_err(export_err)?;

    Ok(path.to_path_buf())
}
