//! Division-code listing retrieval and extraction.
//!
//! The published listing is an HTML table exported from a spreadsheet: every
//! row holds a code cell followed by a name cell, each a `<td class=xlNNN>`.
//! A plain-text variant (`code name` per line) is accepted for local files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::{validate_source_url, DIVISION_CODE_LENGTH};
use crate::error::{ImporterError, Result};
use crate::http::{bytes_to_string, create_client, download_bytes_default};
use crate::types::RawEntry;

/// Table cell holding either a six-digit code or a Han-script name.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CELL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<td class=["']?xl\d+["']?[^>]*>\s*([0-9]{6}|[\p{Han}·]+)\s*</td>"#)
        .expect("valid regex")
});

/// Where to read the listing from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Download over HTTP(S).
    Url(String),
    /// Read a local HTML or plain-text file.
    File(PathBuf),
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Normalize a scraped name (NFC, trimmed).
fn normalize_name(name: &str) -> String {
    name.trim().nfc().collect()
}

/// Extract (name, code) entries from the HTML listing, in document order.
///
/// Each code cell is paired with the name cell that follows it. Cells that
/// cannot be paired are skipped with a warning.
pub fn extract_entries(html: &str) -> Vec<RawEntry> {
    let mut entries = Vec::new();
    let mut pending_code: Option<String> = None;

    for caps in CELL_PATTERN.captures_iter(html) {
        let Some(cell) = caps.get(1) else {
            continue;
        };
        let value = cell.as_str();

        if value.len() == DIVISION_CODE_LENGTH && value.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(orphan) = pending_code.replace(value.to_string()) {
                tracing::warn!(division_code = %orphan, "Code cell without a name, skipping");
            }
        } else if let Some(code) = pending_code.take() {
            entries.push(RawEntry::new(normalize_name(value), code));
        } else {
            tracing::warn!(name = %value, "Name cell without a code, skipping");
        }
    }

    if let Some(orphan) = pending_code {
        tracing::warn!(division_code = %orphan, "Trailing code cell without a name, skipping");
    }

    entries
}

/// Parse the plain-text listing: one `code name` pair per line.
///
/// Blank lines and lines starting with `#` are ignored. A line with only one
/// field is kept with an empty code so it still reaches the builder.
pub fn parse_plain_text(text: &str) -> Vec<RawEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(char::is_whitespace) {
            Some((code, name)) => RawEntry::new(normalize_name(name), code.trim()),
            None => {
                tracing::warn!(line = %line, "Line has no code/name separator");
                RawEntry::new(normalize_name(line), "")
            }
        })
        .collect()
}

/// Download the listing page.
pub fn download_listing(url: &str) -> Result<String> {
    validate_source_url(url)?;
    let client = create_client()?;
    let bytes = download_bytes_default(&client, url).map_err(|e| {
        if let ImporterError::Http(source) = e {
            ImporterError::SourceDownload {
                url: url.to_string(),
                source,
            }
        } else {
            e
        }
    })?;
    Ok(bytes_to_string(&bytes, url))
}

/// Whether a local file should be read as the plain-text listing.
fn is_plain_text(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt" | "tsv")
    )
}

/// Load entries from a URL or a local file.
pub fn load_entries(location: &SourceLocation) -> Result<Vec<RawEntry>> {
    let entries = match location {
        SourceLocation::Url(url) => extract_entries(&download_listing(url)?),
        SourceLocation::File(path) => {
            let content = bytes_to_string(&fs::read(path)?, &path.display().to_string());
            if is_plain_text(path) {
                parse_plain_text(&content)
            } else {
                extract_entries(&content)
            }
        }
    };

    if entries.is_empty() {
        return Err(ImporterError::NoEntries(location.to_string()));
    }

    tracing::info!(source = %location, entries = entries.len(), "Division entries loaded");
    Ok(entries)
}
