//! `ArticleStore` — the durable, keyed store of article rows.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use gdelt_core::{ArticleRow, CountryCode};

use crate::error::CacheResult;

/// Durable storage consumed by the coordinator. Implementations are
/// expected to serialize concurrent upserts by `gkg_record_id`
/// themselves; the core assumes standard relational semantics.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn count_in_day(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<i64>;

    async fn max_date_added(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<Option<i64>>;

    /// Idempotent on `gkg_record_id`. Returns the number of rows written.
    async fn upsert_many(&self, rows: &[ArticleRow]) -> CacheResult<u64>;

    /// Deletes by `created_at`, not `date_added`, so backfilled historical
    /// rows aren't immediately evicted. Returns the number of rows deleted.
    async fn delete_older_than(&self, days: i64) -> CacheResult<u64>;

    async fn select_range(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<Vec<ArticleRow>>;

    /// Total row count across all countries, used to log before/after
    /// storage snapshots around the retention pass.
    async fn count_total(&self) -> CacheResult<i64>;
}

/// `ArticleStore` backed by a `deadpool_postgres` connection pool, handed a
/// pool built and owned by the API crate.
pub struct PostgresArticleStore {
    pool: Pool,
}

impl PostgresArticleStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PostgresArticleStore {
    async fn count_in_day(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<i64> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_one(
                "SELECT count(*) FROM articles WHERE country_code = $1 AND date_added BETWEEN $2 AND $3",
                &[&country.as_str(), &lo, &hi],
            )
            .await?;
        Ok(row.get::<_, i64>(0))
    }

    async fn max_date_added(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<Option<i64>> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_one(
                "SELECT max(date_added) FROM articles WHERE country_code = $1 AND date_added BETWEEN $2 AND $3",
                &[&country.as_str(), &lo, &hi],
            )
            .await?;
        Ok(row.get::<_, Option<i64>>(0))
    }

    async fn upsert_many(&self, rows: &[ArticleRow]) -> CacheResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.pool.get().await?;
        let txn = conn.transaction().await?;
        let stmt = txn
            .prepare(
                "INSERT INTO articles (gkg_record_id, country_code, date_added, payload)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (gkg_record_id) DO UPDATE SET
                    date_added = EXCLUDED.date_added,
                    payload = EXCLUDED.payload",
            )
            .await?;

        let mut written = 0u64;
        for row in rows {
            let n = txn
                .execute(
                    &stmt,
                    &[
                        &row.gkg_record_id,
                        &row.country_code.as_str(),
                        &row.date_added,
                        &row.payload,
                    ],
                )
                .await?;
            written += n;
        }
        txn.commit().await?;
        Ok(written)
    }

    async fn delete_older_than(&self, days: i64) -> CacheResult<u64> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "DELETE FROM articles WHERE created_at < now() - ($1 || ' days')::interval",
                &[&days],
            )
            .await?;
        Ok(n)
    }

    async fn select_range(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<Vec<ArticleRow>> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT gkg_record_id, country_code, date_added, created_at, payload
                 FROM articles
                 WHERE country_code = $1 AND date_added BETWEEN $2 AND $3
                 ORDER BY date_added DESC",
                &[&country.as_str(), &lo, &hi],
            )
            .await?;

        rows.into_iter()
            .map(|r| {
                let code: String = r.get("country_code");
                let country: CountryCode = code
                    .parse()
                    .map_err(|e| crate::error::CacheError::Internal(format!("{e}")))?;
                Ok(ArticleRow {
                    gkg_record_id: r.get("gkg_record_id"),
                    country_code: country,
                    date_added: r.get("date_added"),
                    created_at: r.get("created_at"),
                    payload: r.get("payload"),
                })
            })
            .collect()
    }

    async fn count_total(&self) -> CacheResult<i64> {
        let conn = self.pool.get().await?;
        let row = conn.query_one("SELECT count(*) FROM articles", &[]).await?;
        Ok(row.get::<_, i64>(0))
    }
}

/// In-memory test double: a `RwLock<Vec<ArticleRow>>` guarding a linear scan.
#[derive(Default)]
pub struct MockArticleStore {
    rows: tokio::sync::RwLock<Vec<ArticleRow>>,
}

impl MockArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, rows: Vec<ArticleRow>) {
        *self.rows.write().await = rows;
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl ArticleStore for MockArticleStore {
    async fn count_in_day(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| r.country_code == country && r.date_added >= lo && r.date_added <= hi)
            .count() as i64)
    }

    async fn max_date_added(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<Option<i64>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| r.country_code == country && r.date_added >= lo && r.date_added <= hi)
            .map(|r| r.date_added)
            .max())
    }

    async fn upsert_many(&self, new_rows: &[ArticleRow]) -> CacheResult<u64> {
        let mut rows = self.rows.write().await;
        let mut written = 0u64;
        for incoming in new_rows {
            if let Some(existing) = rows
                .iter_mut()
                .find(|r| r.gkg_record_id == incoming.gkg_record_id)
            {
                *existing = incoming.clone();
            } else {
                rows.push(incoming.clone());
            }
            written += 1;
        }
        Ok(written)
    }

    async fn delete_older_than(&self, days: i64) -> CacheResult<u64> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn select_range(&self, country: CountryCode, lo: i64, hi: i64) -> CacheResult<Vec<ArticleRow>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<ArticleRow> = rows
            .iter()
            .filter(|r| r.country_code == country && r.date_added >= lo && r.date_added <= hi)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        Ok(matched)
    }

    async fn count_total(&self) -> CacheResult<i64> {
        Ok(self.rows.read().await.len() as i64)
    }
}
