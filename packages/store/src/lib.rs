//! PostgreSQL storage for the division tree.
//!
//! [`PgRegionStore`] implements the importer's blocking
//! [`RegionStore`](divcode_importer::RegionStore) trait: each top-level
//! subtree is inserted in its own transaction, so a failed subtree leaves the
//! ones before it committed.

pub mod config;
pub mod db;
pub mod error;
pub mod regions;
pub mod store;

pub use config::StoreConfig;
pub use db::{create_pool, run_migrations};
pub use error::StoreError;
pub use store::PgRegionStore;
