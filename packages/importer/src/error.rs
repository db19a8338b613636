//! Error types for the importer.
//!
//! Store implementations bring their own error types; they surface here boxed,
//! together with the context of the subtree that failed.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error coming from a [`RegionStore`](crate::persist::RegionStore).
pub type StoreFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the importer library.
#[derive(Debug, Error)]
pub enum ImporterError {
    /// Invalid source URL.
    #[error("Invalid source URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidSourceUrl(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to download the division-code listing.
    #[error("Failed to download division codes from {url}: {source}")]
    SourceDownload {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// All retry attempts failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Response exceeded the configured size limit.
    #[error("Response too large: {size} bytes exceeds limit of {limit} bytes")]
    ResponseTooLarge { size: u64, limit: u64 },

    /// The source contained no (code, name) pairs.
    #[error("No division entries found in {0}")]
    NoEntries(String),

    /// More siblings than one materialized path segment can number.
    #[error("Too many children under '{parent}': {count} exceeds the limit of {limit}")]
    SiblingOverflow {
        parent: String,
        count: usize,
        limit: usize,
    },

    /// The store rejected a top-level subtree. Earlier subtrees stay committed.
    #[error(
        "Failed to commit subtree {position} ('{name}') after {committed} committed subtree(s): {source}"
    )]
    SubtreeCommit {
        position: usize,
        name: String,
        committed: usize,
        #[source]
        source: StoreFailure,
    },

    /// The store acknowledged a subtree with the wrong number of identities.
    #[error(
        "Store returned {returned} identities for subtree {position} ('{name}'), expected {expected}"
    )]
    IdentityMismatch {
        position: usize,
        name: String,
        expected: usize,
        returned: usize,
    },

    /// Reading the committed regions back from the store failed.
    #[error("Failed to read regions from store: {0}")]
    StoreRead(#[source] StoreFailure),

    /// Writing the exported document failed.
    #[error("Failed to write export to {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    YamlSerialization(#[from] serde_yaml_ng::Error),
}

/// Result type alias for importer operations.
pub type Result<T> = std::result::Result<T, ImporterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImporterError::InvalidSourceUrl("ftp://x".to_string());
        assert!(err.to_string().contains("ftp://x"));
        assert!(err.to_string().contains("https://"));
    }

    #[test]
    fn test_subtree_commit_display() {
        let err = ImporterError::SubtreeCommit {
            position: 2,
            name: "河北省".to_string(),
            committed: 1,
            source: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to commit subtree 2 ('河北省') after 1 committed subtree(s): connection reset"
        );
    }

    #[test]
    fn test_export_display() {
        let err = ImporterError::Export {
            path: PathBuf::from("out/region.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to write export to out/region.json: denied");
    }
}
