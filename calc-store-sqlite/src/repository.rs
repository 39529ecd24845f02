use anyhow::{Context, Result};
use async_trait::async_trait;
use calc_core::store::effective_cap;
use calc_core::{ResultStore, SavedResult, StoreError};
use chrono::Utc;
use sqlx::{FromRow, sqlite::SqlitePool};
use tracing::debug;

/// Saved results kept in one SQLite table, partitioned by namespace.
pub struct SqliteResultStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteResultStore {
    pub async fn new(
        database_url: &str,
        namespace: &str,
    ) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self {
            pool,
            namespace: namespace.to_string(),
        })
    }

    pub async fn new_with_pool(
        pool: SqlitePool,
        namespace: &str,
    ) -> Self {
        Self {
            pool,
            namespace: namespace.to_string(),
        }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[derive(FromRow)]
struct SavedResultRow {
    id: i64,
    slug: String,
    title: String,
    inputs: String,
    outputs: String,
    timestamp: i64,
}

impl TryFrom<SavedResultRow> for SavedResult {
    type Error = StoreError;

    fn try_from(row: SavedResultRow) -> Result<Self, Self::Error> {
        let decode_error = |column: &str, e: serde_json::Error| {
            StoreError::Serialization(format!(
                "Failed to decode {} of saved result {}: {}",
                column, row.id, e
            ))
        };
        Ok(SavedResult {
            inputs: serde_json::from_str(&row.inputs).map_err(|e| decode_error("inputs", e))?,
            outputs: serde_json::from_str(&row.outputs).map_err(|e| decode_error("outputs", e))?,
            slug: row.slug,
            title: row.title,
            timestamp: row.timestamp,
        })
    }
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn append(
        &self,
        record: SavedResult,
        cap: usize,
    ) -> Result<(), StoreError> {
        let inputs = serde_json::to_string(&record.inputs)?;
        let outputs = serde_json::to_string(&record.outputs)?;
        let keep = i64::try_from(effective_cap(cap)).unwrap_or(i64::MAX);
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query(
            "INSERT INTO saved_results (namespace, slug, title, inputs, outputs, timestamp, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.namespace)
        .bind(&record.slug)
        .bind(&record.title)
        .bind(&inputs)
        .bind(&outputs)
        .bind(record.timestamp)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        let evicted = sqlx::query(
            "DELETE FROM saved_results
             WHERE namespace = ?
               AND id NOT IN (
                   SELECT id FROM saved_results
                   WHERE namespace = ?
                   ORDER BY id DESC
                   LIMIT ?
               )",
        )
        .bind(&self.namespace)
        .bind(&self.namespace)
        .bind(keep)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?
        .rows_affected();

        tx.commit().await.map_err(database_error)?;

        if evicted > 0 {
            debug!(namespace = %self.namespace, evicted, "Evicted oldest saved results");
        }

        Ok(())
    }

    async fn list(&self) -> Result<Vec<SavedResult>, StoreError> {
        let rows: Vec<SavedResultRow> = sqlx::query_as(
            "SELECT id, slug, title, inputs, outputs, timestamp FROM saved_results
             WHERE namespace = ?
             ORDER BY id DESC",
        )
        .bind(&self.namespace)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM saved_results WHERE namespace = ?")
            .bind(&self.namespace)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }
}
