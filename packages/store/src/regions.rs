//! Queries against the `regions` table.

use sqlx::PgPool;

use divcode_importer::persist::validate_batch;
use divcode_importer::{NewRegion, RegionId, RegionRecord};

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
struct RegionRow {
    id: i64,
    parent_id: Option<i64>,
    name: String,
    division_code: String,
    full_name: String,
    code: String,
    level: i32,
}

impl From<RegionRow> for RegionRecord {
    fn from(row: RegionRow) -> Self {
        RegionRecord {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            division_code: row.division_code,
            full_name: row.full_name,
            code: row.code,
            level: row.level,
        }
    }
}

/// Insert one subtree in a single transaction.
///
/// Returns the assigned identities aligned with `rows`. Nothing is committed
/// if any row fails.
pub async fn insert_subtree(pool: &PgPool, rows: &[NewRegion]) -> Result<Vec<RegionId>> {
    validate_batch(rows)?;

    let mut tx = pool.begin().await?;
    let mut ids: Vec<RegionId> = Vec::with_capacity(rows.len());

    for row in rows {
        let parent_id = row.parent.map(|p| ids[p]);
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO regions (parent_id, name, division_code, full_name, code, level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(parent_id)
        .bind(&row.name)
        .bind(&row.division_code)
        .bind(&row.full_name)
        .bind(&row.code)
        .bind(row.level)
        .fetch_one(&mut *tx)
        .await?;
        ids.push(id);
    }

    tx.commit().await?;
    Ok(ids)
}

/// Read every region, ordered by materialized path code.
pub async fn load_all(pool: &PgPool) -> Result<Vec<RegionRecord>> {
    let rows = sqlx::query_as::<_, RegionRow>(
        r#"
        SELECT id, parent_id, name, division_code, full_name, code, level
        FROM regions
        ORDER BY code, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(RegionRecord::from).collect())
}

/// Count stored regions.
pub async fn count(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar(r#"SELECT COUNT(*) FROM regions"#)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Remove every region and reset identities.
pub async fn truncate(pool: &PgPool) -> Result<()> {
    sqlx::query(r#"TRUNCATE regions RESTART IDENTITY"#)
        .execute(pool)
        .await?;
    Ok(())
}
