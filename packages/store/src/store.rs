//! Blocking [`RegionStore`] backed by PostgreSQL.

use sqlx::PgPool;
use tokio::runtime::{Builder, Runtime};

use divcode_importer::{NewRegion, RegionId, RegionRecord, RegionStore};

use crate::config::StoreConfig;
use crate::db::{create_pool, run_migrations};
use crate::error::{Result, StoreError};
use crate::regions;

/// PostgreSQL region store.
///
/// Owns a single-threaded runtime and drives the async queries to completion,
/// so it must not be used from inside another async runtime.
pub struct PgRegionStore {
    runtime: Runtime,
    pool: PgPool,
}

impl PgRegionStore {
    /// Connect to the database and apply pending migrations.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let pool = runtime.block_on(async {
            let pool = create_pool(config).await?;
            run_migrations(&pool).await?;
            Ok::<_, StoreError>(pool)
        })?;

        tracing::info!(max_connections = config.max_connections, "Connected to region store");
        Ok(Self { runtime, pool })
    }

    /// Remove every stored region.
    pub fn truncate(&self) -> Result<()> {
        self.runtime.block_on(regions::truncate(&self.pool))?;
        tracing::info!("Region table truncated");
        Ok(())
    }

    /// Number of stored regions.
    pub fn count(&self) -> Result<i64> {
        self.runtime.block_on(regions::count(&self.pool))
    }
}

impl RegionStore for PgRegionStore {
    type Error = StoreError;

    fn insert_subtree(&mut self, rows: &[NewRegion]) -> Result<Vec<RegionId>> {
        self.runtime
            .block_on(regions::insert_subtree(&self.pool, rows))
    }

    fn load_all(&self) -> Result<Vec<RegionRecord>> {
        self.runtime.block_on(regions::load_all(&self.pool))
    }
}
