//! divcode importer - Rebuild the administrative division tree from a flat
//! division-code listing.
//!
//! The published listing names every province, city and county with a
//! six-digit code, in depth-first order but without any explicit nesting.
//! This crate recovers the tree from the codes alone, commits it one
//! top-level subtree at a time with level and materialized path codes, and
//! exports it as a nested document.
//!
//! # Example
//!
//! ```
//! use divcode_importer::{build, MemoryStore, RawEntry};
//! use divcode_importer::import::{read_documents, run_import};
//!
//! let entries = vec![
//!     RawEntry::new("河北省", "130000"),
//!     RawEntry::new("石家庄市", "130100"),
//!     RawEntry::new("长安区", "130102"),
//!     RawEntry::new("保定市", "130600"),
//! ];
//! assert_eq!(build(entries.clone()).roots().len(), 1);
//!
//! let mut store = MemoryStore::new();
//! run_import(entries, &mut store).unwrap();
//! let docs = read_documents(&store).unwrap();
//! assert_eq!(docs[0].children.len(), 2);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and validation
//! - [`types`]: Core data types (entries, forest, store rows)
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP client for downloading the listing
//! - [`source`]: Listing extraction from HTML or plain text
//! - [`classify`]: Division-code tier classification
//! - [`builder`]: Ancestor-stack hierarchy reconstruction
//! - [`persist`]: Store contract, in-memory store and bulk persistence
//! - [`export`]: Nested document output
//! - [`import`]: Import service
//! - [`cli`]: Command-line interface

pub mod builder;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod import;
pub mod persist;
pub mod source;
pub mod types;

// Re-export main functions
pub use builder::build;
pub use classify::classify;
pub use import::{export_store, run_import};
pub use persist::{persist_forest, MemoryStore, RegionStore};

// Re-export commonly used items
pub use error::{ImporterError, Result};
pub use types::{NewRegion, RawEntry, RegionForest, RegionId, RegionRecord, Tier};
